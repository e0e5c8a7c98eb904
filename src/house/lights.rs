//! Simulated lights: meshes that glow white when switched on.

use super::roles::Role;
use crate::gfx::resources::material::Material;
use crate::gfx::scene::{NodeId, SceneGraph};

#[derive(Debug, Clone)]
pub struct LightSwitch {
    role: Role,
    node: NodeId,
    /// Original material of every mesh in the node's subtree.
    saved: Vec<(NodeId, Material)>,
    on_intensity: f32,
    is_on: bool,
}

impl LightSwitch {
    pub fn new(scene: &SceneGraph, role: Role, node: NodeId, on_intensity: f32) -> Self {
        let saved = scene
            .traverse(node)
            .filter_map(|id| Some((id, scene.node(id)?.material.clone()?)))
            .collect();
        Self {
            role,
            node,
            saved,
            on_intensity,
            is_on: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Flips the switch and returns the new state.
    pub fn toggle(&mut self, scene: &mut SceneGraph) -> bool {
        if self.is_on {
            self.turn_off(scene);
        } else {
            self.turn_on(scene);
        }
        self.is_on
    }

    pub fn turn_on(&mut self, scene: &mut SceneGraph) {
        for (id, original) in &self.saved {
            if let Some(node) = scene.node_mut(*id) {
                node.material = Some(
                    original
                        .clone()
                        .with_color(1.0, 1.0, 1.0)
                        .with_emission(1.0, 1.0, 1.0, self.on_intensity),
                );
            }
        }
        self.is_on = true;
    }

    pub fn turn_off(&mut self, scene: &mut SceneGraph) {
        for (id, original) in &self.saved {
            if let Some(node) = scene.node_mut(*id) {
                node.material = Some(original.clone());
            }
        }
        self.is_on = false;
    }
}
