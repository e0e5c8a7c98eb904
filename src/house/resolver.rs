//! # Name Resolution
//!
//! Finds the scene node behind each role using the loose, inconsistent names
//! modellers give things ("Portón Delantero", "porton_delantero", "Cilindro.004").
//!
//! All searches walk the tree parent-before-children in stored sibling order,
//! and the first hit in that order wins. Nodes with empty names never match.

use std::collections::HashSet;

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::config::{DepthPick, LightSpec, NameMatcher, RoleSpec};
use crate::gfx::scene::{NodeId, SceneGraph};

/// Strips accents, lowercases and trims: `" Portón Delantero "` → `"porton delantero"`.
pub fn normalize_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Resolves `spec` under `root`; `None` means the role is unavailable.
pub fn resolve(scene: &SceneGraph, root: NodeId, spec: &RoleSpec) -> Option<NodeId> {
    resolve_excluding(scene, root, spec, &HashSet::new())
}

/// Like [`resolve`], but never returns a node in `claimed`.
pub fn resolve_excluding(
    scene: &SceneGraph,
    root: NodeId,
    spec: &RoleSpec,
    claimed: &HashSet<NodeId>,
) -> Option<NodeId> {
    let scoped_root = spec
        .scope
        .as_deref()
        .and_then(|scope| scene.find_by_name(root, scope));

    let found = scoped_root
        .and_then(|scope| match_in(scene, scope, spec, claimed))
        .or_else(|| match_in(scene, root, spec, claimed))?;

    if spec.prefer_mesh {
        Some(first_mesh_in(scene, found, claimed).unwrap_or(found))
    } else {
        Some(found)
    }
}

/// Every mesh whose name contains a light keyword, capped at `max_count`.
pub fn resolve_lights(
    scene: &SceneGraph,
    root: NodeId,
    spec: &LightSpec,
    claimed: &HashSet<NodeId>,
) -> Vec<NodeId> {
    let keywords: Vec<String> = spec.keywords.iter().map(|k| k.to_lowercase()).collect();
    scene
        .traverse(root)
        .filter(|id| !claimed.contains(id))
        .filter(|&id| scene.node(id).is_some_and(|n| n.is_mesh()))
        .filter(|&id| {
            let name = scene.name(id).to_lowercase();
            !name.is_empty() && keywords.iter().any(|k| name.contains(k.as_str()))
        })
        .take(spec.max_count)
        .collect()
}

/// Names under `root` that contain any of the role's keywords, for miss diagnostics.
pub fn names_containing<'a>(scene: &'a SceneGraph, root: NodeId, spec: &RoleSpec) -> Vec<&'a str> {
    let keywords: Vec<String> = spec.keywords().map(normalize_name).collect();
    scene
        .traverse(root)
        .map(|id| scene.name(id))
        .filter(|name| {
            let normalized = normalize_name(name);
            !normalized.is_empty() && keywords.iter().any(|k| normalized.contains(k.as_str()))
        })
        .collect()
}

fn match_in(
    scene: &SceneGraph,
    root: NodeId,
    spec: &RoleSpec,
    claimed: &HashSet<NodeId>,
) -> Option<NodeId> {
    spec.matchers
        .iter()
        .find_map(|matcher| apply_matcher(scene, root, matcher, claimed))
}

fn apply_matcher(
    scene: &SceneGraph,
    root: NodeId,
    matcher: &NameMatcher,
    claimed: &HashSet<NodeId>,
) -> Option<NodeId> {
    let mut candidates = scene
        .traverse(root)
        .filter(|id| !claimed.contains(id) && !scene.name(*id).is_empty());

    match matcher {
        NameMatcher::Exact(names) => names.iter().find_map(|wanted| {
            scene
                .traverse(root)
                .find(|id| !claimed.contains(id) && scene.name(*id) == wanted.as_str())
        }),
        NameMatcher::Substring(keywords) => {
            let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
            candidates.find(|&id| {
                let name = scene.name(id).to_lowercase();
                keywords.iter().any(|k| name.contains(k.as_str()))
            })
        }
        NameMatcher::Normalized(keywords) => {
            let keywords: Vec<String> = keywords.iter().map(|k| normalize_name(k)).collect();
            candidates.find(|&id| {
                let name = normalize_name(scene.name(id));
                keywords
                    .iter()
                    .any(|k| !k.is_empty() && name.contains(k.as_str()))
            })
        }
        NameMatcher::DepthExtreme { keywords, pick } => {
            let keywords: Vec<String> = keywords.iter().map(|k| normalize_name(k)).collect();
            let mut best: Option<(NodeId, f32)> = None;
            for id in candidates {
                let is_mesh = scene.node(id).is_some_and(|n| n.is_mesh());
                let name = normalize_name(scene.name(id));
                if !is_mesh || !keywords.iter().any(|k| name.contains(k.as_str())) {
                    continue;
                }
                let z = scene.world_position(id).z;
                let better = match (best, pick) {
                    (None, _) => true,
                    (Some((_, best_z)), DepthPick::Front) => z < best_z,
                    (Some((_, best_z)), DepthPick::Back) => z > best_z,
                };
                if better {
                    best = Some((id, z));
                }
            }
            best.map(|(id, _)| id)
        }
    }
}

fn first_mesh_in(scene: &SceneGraph, root: NodeId, claimed: &HashSet<NodeId>) -> Option<NodeId> {
    scene
        .traverse(root)
        .find(|id| !claimed.contains(id) && scene.node(*id).is_some_and(|n| n.is_mesh()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NameMatcher::*, ViewerConfig};
    use crate::gfx::geometry::generate_cube;
    use crate::gfx::resources::material::Material;
    use crate::gfx::scene::{MeshData, Transform};
    use crate::house::Role;
    use cgmath::Vector3;

    fn mesh(scene: &mut SceneGraph, parent: NodeId, name: &str, z: f32) -> NodeId {
        let id = scene.add_mesh_node(
            parent,
            name,
            MeshData::from_geometry(&generate_cube()),
            Material::default(),
        );
        scene.set_transform(id, Transform::from_translation(Vector3::new(0.0, 0.0, z)));
        id
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize_name("  Portón Delantero "), "porton delantero");
        assert_eq!(normalize_name("puerta_baño"), "puerta_bano");
        assert_eq!(normalize_name("LÁMPARA"), "lampara");
    }

    #[test]
    fn test_exact_name_wins_over_substring() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let _decoy = scene.add_node(root, "PuertaGarajeVieja");
        let garage = scene.add_node(root, "PuertaGaraje");

        let spec = RoleSpec::new(
            Role::FrontGate,
            vec![Exact(names(&["PuertaGaraje"])), Substring(names(&["garaje"]))],
        );
        assert_eq!(resolve(&scene, root, &spec), Some(garage));
    }

    #[test]
    fn test_substring_is_case_insensitive_and_ordered() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = scene.add_node(root, "Grupo");
        let first = scene.add_node(group, "Porton_Trasero_1");
        let _second = scene.add_node(root, "porton_trasero_2");

        let spec = RoleSpec::new(Role::RearGate, vec![Substring(names(&["PORTON_TRASERO"]))]);
        assert_eq!(resolve(&scene, root, &spec), Some(first));
    }

    #[test]
    fn test_normalized_match_handles_accents() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene.add_node(root, "Techo");
        let gate = scene.add_node(root, "Portón Delantero");

        let spec = RoleSpec::new(
            Role::FrontGate,
            vec![Normalized(names(&["porton delantero", "front gate"]))],
        );
        assert_eq!(resolve(&scene, root, &spec), Some(gate));
    }

    #[test]
    fn test_no_match_is_none() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene.add_node(root, "Techo");
        scene.add_node(root, "");

        let spec = RoleSpec::new(Role::MainDoor, vec![Substring(names(&["door"]))]);
        assert_eq!(resolve(&scene, root, &spec), None);
    }

    #[test]
    fn test_scope_searched_first_then_whole_model() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let outside = scene.add_node(root, "puerta_cuarto");
        let collection = scene.add_node(root, "Collection 1");
        let inside = scene.add_node(collection, "puerta_cuarto");

        let spec = RoleSpec::new(Role::InteriorDoor(0), vec![Exact(names(&["puerta_cuarto"]))])
            .with_scope("Collection 1");
        assert_eq!(resolve(&scene, root, &spec), Some(inside));

        let unscoped = RoleSpec::new(Role::InteriorDoor(1), vec![Exact(names(&["puerta_cuarto"]))])
            .with_scope("Collection 9");
        assert_eq!(resolve(&scene, root, &unscoped), Some(outside));
    }

    #[test]
    fn test_prefer_mesh_descends_into_group() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = scene.add_node(root, "CortinaDelantera");
        let inner = mesh(&mut scene, group, "Cilindro.004_mesh", 0.0);

        let spec = RoleSpec::new(Role::FrontCurtain, vec![Exact(names(&["CortinaDelantera"]))])
            .with_prefer_mesh();
        assert_eq!(resolve(&scene, root, &spec), Some(inner));
    }

    #[test]
    fn test_depth_extreme_picks_front_and_back() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        mesh(&mut scene, root, "Cilindro.010", 0.5);
        let back = mesh(&mut scene, root, "Cylinder.2", 2.0);
        let front = mesh(&mut scene, root, "Cilindro.001", -1.0);

        let front_spec = RoleSpec::new(
            Role::FrontCurtain,
            vec![DepthExtreme {
                keywords: names(&["cilindro", "cylinder"]),
                pick: DepthPick::Front,
            }],
        );
        let back_spec = RoleSpec::new(
            Role::RearCurtain,
            vec![DepthExtreme {
                keywords: names(&["cilindro", "cylinder"]),
                pick: DepthPick::Back,
            }],
        );
        assert_eq!(resolve(&scene, root, &front_spec), Some(front));
        assert_eq!(resolve(&scene, root, &back_spec), Some(back));
    }

    #[test]
    fn test_claimed_nodes_are_skipped() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let first = scene.add_node(root, "puerta_cuarto");
        let second = scene.add_node(root, "Puerta Principal");

        let spec = RoleSpec::new(Role::MainDoor, vec![Substring(names(&["puerta"]))]);
        let claimed: HashSet<NodeId> = [first].into_iter().collect();
        assert_eq!(resolve_excluding(&scene, root, &spec, &claimed), Some(second));
    }

    #[test]
    fn test_lights_capped_and_mesh_only() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene.add_node(root, "Luz_grupo"); // not a mesh
        let lights: Vec<NodeId> = (0..6)
            .map(|i| mesh(&mut scene, root, &format!("Farol.{i:03}"), 0.0))
            .collect();

        let found = resolve_lights(&scene, root, &LightSpec::default(), &HashSet::new());
        assert_eq!(found, lights[..4].to_vec());
    }

    #[test]
    fn test_default_config_binds_typical_names() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let floor = mesh(&mut scene, root, "Cube.002", 0.0);
        let gate = mesh(&mut scene, root, "Portón Trasero", 0.0);

        let config = ViewerConfig::default();
        let floor_spec = config.role_spec(Role::Floor).unwrap();
        let gate_spec = config.role_spec(Role::RearGate).unwrap();
        assert_eq!(resolve(&scene, root, floor_spec), Some(floor));
        assert_eq!(resolve(&scene, root, gate_spec), Some(gate));
    }

    #[test]
    fn test_names_containing_lists_candidates() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene.add_node(root, "Cortina Vieja");
        scene.add_node(root, "Techo");

        let spec = RoleSpec::new(Role::ExtraCurtain, vec![Normalized(names(&["cortina"]))]);
        assert_eq!(names_containing(&scene, root, &spec), vec!["Cortina Vieja"]);
    }
}
