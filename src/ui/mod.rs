//! # User Interface Module
//!
//! Dear ImGui overlay for the viewer.
//!
//! - [`UiManager`] - imgui context, winit input and wgpu rendering
//! - [`panel`] - the control bar with one button per house control
//!
//! Input goes to imgui first; when it wants the mouse or keyboard, the camera
//! and the drag controller do not see the event.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::{control_bar, ControlBarState};
