//! # Scene Graph
//!
//! An arena of named nodes with parent/child links. Nodes are addressed by
//! [`NodeId`] and never removed, so ids stay valid for the life of the graph.
//!
//! ## Usage
//!
//! ```no_run
//! use casaview::gfx::scene::{SceneGraph, Transform};
//! use cgmath::Vector3;
//!
//! let mut scene = SceneGraph::new();
//! let door = scene.add_node(scene.root(), "Puerta");
//! scene.set_transform(door, Transform::from_translation(Vector3::new(1.0, 0.0, 0.0)));
//!
//! let pivot = scene.add_node(scene.root(), "PuertaPivot");
//! scene.attach(door, pivot).unwrap(); // world placement of the door is unchanged
//! ```

use cgmath::{Matrix4, SquareMatrix, Vector3};

use super::mesh::MeshData;
use super::transform::{compute_local_transform_for_reparent, Transform};
use crate::error::SceneError;
use crate::gfx::picking::AABB;
use crate::gfx::resources::material::Material;

/// Stable handle to a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single named node.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<MeshData>,
    pub material: Option<Material>,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            transform: Transform::identity(),
            mesh: None,
            material: None,
            visible: true,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_mesh(&self) -> bool {
        self.mesh.is_some()
    }
}

/// Tree of nodes rooted at a single unnamed-by-convention "Scene" node.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("Scene".to_string(), None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Name of a node, empty for unknown ids.
    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).map(|n| n.name.as_str()).unwrap_or("")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.node(id).map(|n| &n.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.node_mut(id).map(|n| &mut n.transform)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) {
        if let Some(node) = self.node_mut(id) {
            node.transform = transform;
        }
    }

    /// Adds an empty node under `parent`. Unknown parents fall back to the root.
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let parent = if self.contains(parent) { parent } else { self.root() };
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name.into(), Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Adds a renderable node under `parent`.
    pub fn add_mesh_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        mesh: MeshData,
        material: Material,
    ) -> NodeId {
        let id = self.add_node(parent, name);
        let node = &mut self.nodes[id.0];
        node.mesh = Some(mesh);
        node.material = Some(material);
        id
    }

    /// Depth-first, pre-order walk of `start` and everything below it.
    pub fn traverse(&self, start: NodeId) -> Traverse<'_> {
        let stack = if self.contains(start) { vec![start] } else { Vec::new() };
        Traverse { graph: self, stack }
    }

    /// Whether `node` is `ancestor` or lies somewhere below it.
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// First node in pre-order below `start` whose name is exactly `name`.
    pub fn find_by_name(&self, start: NodeId, name: &str) -> Option<NodeId> {
        self.traverse(start).find(|&id| self.name(id) == name)
    }

    /// Product of local matrices from the root down to `id`.
    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut matrix = Matrix4::identity();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.node(c)) {
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    pub fn world_position(&self, id: NodeId) -> Vector3<f32> {
        self.world_matrix(id).w.truncate()
    }

    /// Converts a world-space point into the local space of `id`'s parent.
    pub fn world_to_parent_local(&self, id: NodeId, point: Vector3<f32>) -> Vector3<f32> {
        let parent_world = self
            .parent(id)
            .map(|p| self.world_matrix(p))
            .unwrap_or_else(Matrix4::identity);
        let inverse = parent_world.invert().unwrap_or_else(Matrix4::identity);
        (inverse * point.extend(1.0)).truncate()
    }

    /// World-space bounds of every mesh in the subtree, `None` if there are none.
    pub fn world_bounding_box(&self, id: NodeId) -> Option<AABB> {
        self.traverse(id)
            .filter_map(|n| {
                let local = self.node(n)?.mesh.as_ref()?.local_bounds()?;
                Some(local.transform(&self.world_matrix(n)))
            })
            .reduce(|a, b| a.union(&b))
    }

    /// Whether `id` and all of its ancestors are visible.
    pub fn is_visible_in_tree(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.node(c)) {
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Moves `child` under `new_parent` and rewrites its local transform so its
    /// world matrix is unchanged.
    pub fn attach(&mut self, child: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        if !self.contains(child) {
            return Err(SceneError::UnknownNode(child));
        }
        if !self.contains(new_parent) {
            return Err(SceneError::UnknownNode(new_parent));
        }
        if child == self.root() {
            return Err(SceneError::RootImmovable);
        }
        if self.is_descendant_of(new_parent, child) {
            return Err(SceneError::Cycle {
                child,
                parent: new_parent,
            });
        }

        let child_world = self.world_matrix(child);
        let parent_world = self.world_matrix(new_parent);
        self.nodes[child.0].transform =
            compute_local_transform_for_reparent(&child_world, &parent_world);
        self.relink(child, new_parent);
        Ok(())
    }

    /// Deep-copies the subtree at `source` under `new_parent`.
    pub fn clone_subtree(&mut self, source: NodeId, new_parent: NodeId) -> Option<NodeId> {
        let template = self.node(source)?.clone();
        let copy = self.add_node(new_parent, template.name.clone());
        {
            let node = &mut self.nodes[copy.0];
            node.transform = template.transform;
            node.mesh = template.mesh;
            node.material = template.material;
            node.visible = template.visible;
        }
        for child in template.children {
            self.clone_subtree(child, copy);
        }
        Some(copy)
    }

    fn relink(&mut self, child: NodeId, new_parent: NodeId) {
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|&c| c != child);
        }
        self.nodes[child.0].parent = Some(new_parent);
        self.nodes[new_parent.0].children.push(child);
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-order iterator returned by [`SceneGraph::traverse`].
pub struct Traverse<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeId>,
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.graph.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use cgmath::InnerSpace;

    fn cube(scene: &mut SceneGraph, parent: NodeId, name: &str) -> NodeId {
        scene.add_mesh_node(
            parent,
            name,
            MeshData::from_geometry(&generate_cube()),
            Material::default(),
        )
    }

    #[test]
    fn test_preorder_traversal() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root(), "a");
        let a1 = scene.add_node(a, "a1");
        let b = scene.add_node(scene.root(), "b");
        let a2 = scene.add_node(a, "a2");

        let order: Vec<NodeId> = scene.traverse(scene.root()).collect();
        assert_eq!(order, vec![scene.root(), a, a1, a2, b]);
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut scene = SceneGraph::new();
        let parent = scene.add_node(scene.root(), "parent");
        scene.set_transform(
            parent,
            Transform::from_translation(Vector3::new(1.0, 0.0, 0.0))
                .with_scale(Vector3::new(2.0, 2.0, 2.0)),
        );
        let child = scene.add_node(parent, "child");
        scene.set_transform(child, Transform::from_translation(Vector3::new(0.0, 1.0, 0.0)));

        assert_eq!(scene.world_position(child), Vector3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_world_bounding_box_unions_subtree() {
        let mut scene = SceneGraph::new();
        let group = scene.add_node(scene.root(), "group");
        let left = cube(&mut scene, group, "left");
        let right = cube(&mut scene, group, "right");
        scene.set_transform(left, Transform::from_translation(Vector3::new(-2.0, 0.0, 0.0)));
        scene.set_transform(right, Transform::from_translation(Vector3::new(2.0, 0.0, 0.0)));

        let bounds = scene.world_bounding_box(group).unwrap();
        assert_eq!(bounds.min, Vector3::new(-2.5, -0.5, -0.5));
        assert_eq!(bounds.max, Vector3::new(2.5, 0.5, 0.5));

        let empty = scene.add_node(scene.root(), "empty");
        assert!(scene.world_bounding_box(empty).is_none());
    }

    #[test]
    fn test_attach_preserves_world_position() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let door = cube(&mut scene, root, "door");
        scene.set_transform(
            door,
            Transform::from_translation(Vector3::new(1.0, 2.0, 3.0))
                .with_rotation(Vector3::new(0.0, 0.5, 0.0)),
        );
        let before = scene.world_bounding_box(door).unwrap();

        let pivot = scene.add_node(scene.root(), "pivot");
        scene.set_transform(
            pivot,
            Transform::from_translation(Vector3::new(0.5, 2.5, 3.0))
                .with_rotation(Vector3::new(0.0, 0.3, 0.0)),
        );
        scene.attach(door, pivot).unwrap();

        assert_eq!(scene.parent(door), Some(pivot));
        assert!(scene.children(scene.root()).iter().all(|&c| c != door));
        let after = scene.world_bounding_box(door).unwrap();
        assert!((after.min - before.min).magnitude() < 1e-4);
        assert!((after.max - before.max).magnitude() < 1e-4);
    }

    #[test]
    fn test_attach_rejects_cycles_and_root() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root(), "a");
        let b = scene.add_node(a, "b");

        assert_eq!(
            scene.attach(a, b),
            Err(SceneError::Cycle { child: a, parent: b })
        );
        assert_eq!(scene.attach(scene.root(), a), Err(SceneError::RootImmovable));
        assert_eq!(scene.parent(b), Some(a));
    }

    #[test]
    fn test_clone_subtree_copies_children() {
        let mut scene = SceneGraph::new();
        let pivot = scene.add_node(scene.root(), "pivot");
        cube(&mut scene, pivot, "panel");

        let copy = scene.clone_subtree(pivot, scene.root()).unwrap();
        assert_ne!(copy, pivot);
        assert_eq!(scene.children(copy).len(), 1);
        let panel_copy = scene.children(copy)[0];
        assert_eq!(scene.name(panel_copy), "panel");
        assert!(scene.node(panel_copy).unwrap().is_mesh());
    }

    #[test]
    fn test_visibility_inherits() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root(), "a");
        let b = scene.add_node(a, "b");
        scene.node_mut(a).unwrap().visible = false;
        assert!(!scene.is_visible_in_tree(b));
    }
}
