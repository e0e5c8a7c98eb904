//! CPU-side mesh data attached to scene nodes.

use super::vertex::Vertex3D;
use crate::gfx::geometry::GeometryData;
use crate::gfx::picking::AABB;

/// Indexed triangle mesh in node-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Builds a mesh from flat OBJ-style arrays.
    ///
    /// When `normals` is empty or does not match the position count, flat
    /// face normals are computed from the triangles instead.
    pub fn from_flat(positions: &[f32], normals: &[f32], indices: Vec<u32>) -> Self {
        let vertex_count = positions.len() / 3;
        let normals = if normals.len() == positions.len() {
            normals.to_vec()
        } else {
            calculate_face_normals(positions, &indices)
        };

        let vertices = (0..vertex_count)
            .map(|i| Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            })
            .collect();

        Self { vertices, indices }
    }

    pub fn from_geometry(geometry: &GeometryData) -> Self {
        let (vertices, indices) = geometry.to_scene_format();
        Self { vertices, indices }
    }

    /// Local-space bounds, or `None` for an empty mesh.
    pub fn local_bounds(&self) -> Option<AABB> {
        if self.vertices.is_empty() {
            return None;
        }
        let positions: Vec<[f32; 3]> = self.vertices.iter().map(|v| v.position).collect();
        Some(AABB::from_vertices(&positions))
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Accumulates per-face normals onto the vertices they touch.
fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut normals = vec![0.0f32; positions.len()];
    let at = |i: usize| {
        cgmath::Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
    };

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if [a, b, c].iter().any(|&i| i * 3 + 2 >= positions.len()) {
            continue;
        }
        let n = (at(b) - at(a)).cross(at(c) - at(a));
        for idx in [a, b, c] {
            normals[idx * 3] += n.x;
            normals[idx * 3 + 1] += n.y;
            normals[idx * 3 + 2] += n.z;
        }
    }

    for n in normals.chunks_exact_mut(3) {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len > f32::EPSILON {
            n.iter_mut().for_each(|c| *c /= len);
        } else {
            n.copy_from_slice(&[0.0, 1.0, 0.0]);
        }
    }
    normals
}
