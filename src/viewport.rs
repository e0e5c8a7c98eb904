//! # Viewport
//!
//! The capability the house logic needs from the 3D view: create helper nodes,
//! measure world bounds, and turn cursor positions into world-space hits.
//! [`SceneViewport`] implements it over the scene graph and orbit camera; tests
//! can drive the same code with no window or GPU.

use cgmath::Vector3;

use crate::gfx::camera::orbit_camera::OrbitCamera;
use crate::gfx::picking::{screen_to_ray, Plane, Ray, RayHit, AABB};
use crate::gfx::scene::{NodeId, SceneGraph};

/// Cursor position in physical pixels, origin at the top-left.
pub type ScreenPoint = (f32, f32);

pub trait Viewport {
    fn scene(&self) -> &SceneGraph;

    fn scene_mut(&mut self) -> &mut SceneGraph;

    /// Adds an empty transform node under `parent`.
    fn create_anchor_node(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.scene_mut().add_node(parent, name)
    }

    fn bounding_box_world(&self, node: NodeId) -> Option<AABB> {
        self.scene().world_bounding_box(node)
    }

    /// Where the cursor ray meets `plane`, if it does.
    fn screen_to_world_on_plane(&self, screen: ScreenPoint, plane: &Plane) -> Option<Vector3<f32>>;

    /// Hits of the cursor ray against meshes in `node`'s subtree, nearest first.
    fn raycast_against(&self, node: NodeId, screen: ScreenPoint) -> Vec<RayHit<NodeId>>;
}

/// Scene graph plus the camera it is viewed through.
pub struct SceneViewport {
    pub scene: SceneGraph,
    pub camera: OrbitCamera,
    screen_size: (f32, f32),
}

impl SceneViewport {
    pub fn new(scene: SceneGraph, camera: OrbitCamera, width: u32, height: u32) -> Self {
        let mut viewport = Self {
            scene,
            camera,
            screen_size: (1.0, 1.0),
        };
        viewport.resize(width, height);
        viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen_size = (width.max(1) as f32, height.max(1) as f32);
        self.camera.resize_projection(width.max(1), height.max(1));
    }

    pub fn screen_size(&self) -> (f32, f32) {
        self.screen_size
    }

    pub fn ray(&self, screen: ScreenPoint) -> Ray {
        screen_to_ray(screen, self.screen_size, &self.camera)
    }
}

impl Viewport for SceneViewport {
    fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    fn screen_to_world_on_plane(&self, screen: ScreenPoint, plane: &Plane) -> Option<Vector3<f32>> {
        self.ray(screen).intersect_plane(plane)
    }

    fn raycast_against(&self, node: NodeId, screen: ScreenPoint) -> Vec<RayHit<NodeId>> {
        let ray = self.ray(screen);
        let mut hits: Vec<RayHit<NodeId>> = self
            .scene
            .traverse(node)
            .filter_map(|id| {
                let local = self.scene.node(id)?.mesh.as_ref()?.local_bounds()?;
                let bounds = local.transform(&self.scene.world_matrix(id));
                let distance = bounds.intersect_ray(&ray)?;
                Some(RayHit {
                    target: id,
                    distance,
                    point: ray.point_at(distance),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
