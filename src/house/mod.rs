//! # House Controls
//!
//! Everything that turns a static house asset into something interactive:
//!
//! - [`resolver`] finds the nodes behind each [`Role`] by name
//! - [`pivot`] builds hinge and panel anchors so objects swing or drop from
//!   the right place
//! - [`animator`] steps tweens once per frame
//! - [`controllable`] is the open/close state machine per control
//! - [`drag`] moves curtain pivots with Shift+drag
//! - [`lights`] switches light meshes between their own and a glowing material
//! - [`model`] wires all of the above together after a model loads

pub mod animator;
pub mod controllable;
pub mod drag;
pub mod lights;
pub mod model;
pub mod pivot;
pub mod resolver;
pub mod roles;

pub use animator::{Animator, TweenCompleted, TweenProperty};
pub use controllable::{ControlState, Controllable, Direction, ToggleOutcome};
pub use drag::{DragController, DragMode, PointerButton, PointerEvent};
pub use model::{ControlView, HouseModel, RoleBinding, ViewerEvent};
pub use pivot::PivotAnchor;
pub use roles::Role;
