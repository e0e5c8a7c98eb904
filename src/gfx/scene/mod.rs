//! # Scene Module
//!
//! The node tree the viewer works on: named nodes with local transforms,
//! optional meshes and materials, and the OBJ loader that fills it.
//!
//! ## Key Components
//!
//! - [`SceneGraph`] - arena of nodes addressed by [`NodeId`]
//! - [`Transform`] - local TRS with XYZ Euler rotation
//! - [`MeshData`] / [`Vertex3D`] - CPU mesh data, uploaded lazily by the renderer
//! - [`loader`] - OBJ/MTL import through `tobj`

pub mod graph;
pub mod loader;
pub mod mesh;
pub mod transform;
pub mod vertex;

pub use graph::{Node, NodeId, SceneGraph};
pub use mesh::MeshData;
pub use transform::{compute_local_transform_for_reparent, Transform};
pub use vertex::Vertex3D;
