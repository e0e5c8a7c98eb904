//! # Graphics Module
//!
//! Everything between the house logic and the GPU.
//!
//! - **Camera** ([`camera`]) - orbit camera and its mouse/keyboard controller
//! - **Scene** ([`scene`]) - the node tree, transforms, meshes and OBJ import
//! - **Geometry** ([`geometry`]) - generated boxes and spheres for panels and handles
//! - **Picking** ([`picking`]) - rays, planes and bounding boxes
//! - **Resources** ([`resources`]) - materials and GPU uniform layouts
//! - **Render engine** ([`RenderEngine`]) - draws the scene and the UI overlay
//!
//! Only [`RenderEngine`] and the resource bindings touch wgpu; the rest is
//! plain data the house logic and its tests can use without a GPU.

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod render_engine;
pub mod resources;
pub mod scene;

pub use camera::orbit_camera::OrbitCamera;
pub use render_engine::RenderEngine;
