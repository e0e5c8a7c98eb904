//! OBJ/MTL import
//!
//! Every OBJ object becomes a mesh node directly under a single group node
//! named after the file, so role lookups can search by the names the modeller
//! gave each object.

use std::path::Path;

use super::graph::{NodeId, SceneGraph};
use super::mesh::MeshData;
use crate::error::ViewerError;
use crate::gfx::resources::material::Material;

/// Loads an OBJ file into `scene` under `parent` and returns the new group node.
///
/// A missing or broken MTL file is not fatal; affected meshes get the default
/// material.
pub fn load_obj_into(
    scene: &mut SceneGraph,
    parent: NodeId,
    path: &Path,
) -> Result<NodeId, ViewerError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| ViewerError::ModelLoad {
        path: path.display().to_string(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("No usable MTL for {}: {e}, using default materials", path.display());
        Vec::new()
    });
    let materials: Vec<Material> = materials.iter().enumerate().map(convert_material).collect();

    let group_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let group = scene.add_node(parent, group_name);

    for (i, model) in models.iter().enumerate() {
        let mesh = &model.mesh;
        let name = if model.name.is_empty() {
            format!("object_{i}")
        } else {
            model.name.clone()
        };
        let material = mesh
            .material_id
            .and_then(|id| materials.get(id).cloned())
            .unwrap_or_default();

        log::debug!(
            "Loaded '{}': {} vertices, {} triangles",
            name,
            mesh.positions.len() / 3,
            mesh.indices.len() / 3
        );
        scene.add_mesh_node(
            group,
            name,
            MeshData::from_flat(&mesh.positions, &mesh.normals, mesh.indices.clone()),
            material,
        );
    }

    log::info!("Loaded {} objects from {}", models.len(), path.display());
    Ok(group)
}

fn convert_material((i, mtl): (usize, &tobj::Material)) -> Material {
    let name = if mtl.name.is_empty() {
        format!("material_{i}")
    } else {
        mtl.name.clone()
    };
    let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    Material::new(
        &name,
        [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)],
        0.0,
        // MTL has no roughness; approximate it from the specular exponent.
        1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_named_objects() {
        let dir = std::env::temp_dir().join(format!("casaview_loader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("casa.obj");
        std::fs::write(
            &path,
            "o Puerta\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n\
             o Cube.002\nv 0 0 0\nv 2 0 0\nv 0 0 2\nf 4 5 6\n",
        )
        .unwrap();

        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = load_obj_into(&mut scene, root, &path).unwrap();

        assert_eq!(scene.name(group), "casa");
        let names: Vec<&str> = scene.children(group).iter().map(|&c| scene.name(c)).collect();
        assert_eq!(names, vec!["Puerta", "Cube.002"]);
        assert!(scene.world_bounding_box(group).is_some());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let result = load_obj_into(&mut scene, root, Path::new("/nonexistent/casa.obj"));
        assert!(matches!(result, Err(ViewerError::ModelLoad { .. })));
    }
}
