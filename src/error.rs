//! # Error Types
//!
//! Three layers of failure live here:
//!
//! - [`ViewerError`] for things that stop the viewer from starting (bad model
//!   file, unreadable config, no GPU adapter).
//! - [`BindingIssue`] for recoverable problems while wiring a model up. These
//!   are logged at `warn` and collected on the house model; the affected
//!   control is simply reported as unavailable.
//! - [`AnimatorError`], [`SceneError`] and [`ToggleRejection`] for requests
//!   that were refused at runtime.

use thiserror::Error;

use crate::gfx::scene::NodeId;
use crate::house::Role;

/// Fatal errors raised while starting the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to load model '{path}': {source}")]
    ModelLoad {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid viewer config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to acquire GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Recoverable problems found while binding roles to scene nodes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingIssue {
    #[error("no node matched role {role}")]
    ResolutionMiss { role: Role },

    #[error("node '{name}' for role {role} has no usable bounds, using a fallback")]
    GeometryDegenerate { role: Role, name: String },

    #[error("toggle requested for {role}, which has no bound control")]
    InvalidTransition { role: Role },
}

/// Reasons the animator refuses to start a tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnimatorError {
    #[error("a fixed-velocity rotation is already in flight")]
    Busy,

    #[error("tween target {0:?} is not in the scene")]
    MissingNode(NodeId),
}

/// Structural edits the scene graph refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("node {0:?} is not in the scene")]
    UnknownNode(NodeId),

    #[error("cannot attach {child:?} under its own descendant {parent:?}")]
    Cycle { child: NodeId, parent: NodeId },

    #[error("the scene root cannot be re-parented")]
    RootImmovable,
}

/// Why a toggle request was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ToggleRejection {
    #[error(transparent)]
    Animator(#[from] AnimatorError),

    #[error("{0} is being dragged")]
    Dragging(Role),
}
