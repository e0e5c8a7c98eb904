//! casaview
//!
//! An interactive viewer for a 3D house model. After an OBJ model loads, named
//! parts are bound to roles (doors, gates, curtains, lights, floor), given
//! pivots so they open from the right place, and driven by a control bar:
//! doors and gates swing, curtains drop or retract, lights switch on and off,
//! and curtains can be repositioned with Shift+drag.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod house;
pub mod ui;
pub mod viewport;
pub mod wgpu_utils;

pub use app::CasaApp;
pub use config::ViewerConfig;
pub use error::ViewerError;
pub use house::HouseModel;
