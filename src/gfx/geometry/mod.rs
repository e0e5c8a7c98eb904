//! # Procedural Geometry
//!
//! Generated shapes for the parts of the scene the viewer adds itself: the
//! curtain panels and the pick handles on draggable pivots.
//!
//! ## Usage
//!
//! ```rust
//! use casaview::gfx::geometry::{generate_box, generate_sphere};
//!
//! // A thin slab, 1 x 1 x 0.05
//! let panel = generate_box(1.0, 1.0, 0.05);
//!
//! // A small handle sphere
//! let handle = generate_sphere(0.05, 16, 8);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Generated geometry data ready for conversion into a scene mesh
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves positions and normals into the renderer's vertex format.
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
