//! Materials and the GPU resources the renderer builds from them.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

pub use global_bindings::{GlobalBindings, GlobalUBO, LightConfig};
pub use material::Material;
pub use texture_resource::TextureResource;
