//! Uniform bindings for the viewer's single render pipeline.
//!
//! Group 0 holds per-frame data (camera and key light), group 1 holds the
//! per-node model matrix and material. Both layouts must match the structs
//! declared in `shader.wgsl`.

use cgmath::{Matrix, Matrix4, SquareMatrix};

use crate::gfx::camera::camera_utils::CameraUniform;
use crate::gfx::resources::material::Material;
use crate::wgpu_utils::{binding_types, uniform_buffer::UniformBuffer};

/// Per-frame uniforms. MUST match `Globals` in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// Direction the key light travels, world space.
    light_direction: [f32; 3],
    ambient: f32,
}

/// Per-node uniforms. MUST match `Object` in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUBOContent {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    base_color: [f32; 4],
    emissive: [f32; 3],
    emissive_intensity: f32,
    metallic: f32,
    roughness: f32,
    _padding: [f32; 2],
}

impl ObjectUBOContent {
    pub fn new(world: Matrix4<f32>, material: &Material) -> Self {
        let normal_matrix = world
            .invert()
            .map(|m| m.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: world.into(),
            normal_matrix: normal_matrix.into(),
            base_color: material.base_color,
            emissive: material.emissive,
            emissive_intensity: material.emissive_intensity,
            metallic: material.metallic,
            roughness: material.roughness,
            _padding: [0.0; 2],
        }
    }
}

/// Key light shading the whole house.
#[derive(Copy, Clone, Debug)]
pub struct LightConfig {
    pub direction: [f32; 3],
    pub ambient: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [-0.4, -1.0, -0.6],
            ambient: 0.25,
        }
    }
}

pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;
pub type ObjectUBO = UniformBuffer<ObjectUBOContent>;

/// Writes this frame's camera and light into the global buffer.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: LightConfig,
) {
    ubo.update_content(
        queue,
        GlobalUBOContent {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            light_direction: light.direction,
            ambient: light.ambient,
        },
    );
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: binding_types::uniform(),
            count: None,
        }],
    })
}

fn uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    resource: wgpu::BindingResource,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource,
        }],
    })
}

/// Layouts for both groups plus the bound global buffer.
pub struct GlobalBindings {
    global_layout: wgpu::BindGroupLayout,
    object_layout: wgpu::BindGroupLayout,
    global_bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let global_layout = uniform_layout(device, "Globals Bind Group Layout");
        let object_layout = uniform_layout(device, "Object Bind Group Layout");
        let global_bind_group = uniform_bind_group(
            device,
            &global_layout,
            ubo.binding_resource(),
            "Globals Bind Group",
        );
        Self {
            global_layout,
            object_layout,
            global_bind_group,
        }
    }

    pub fn layouts(&self) -> [&wgpu::BindGroupLayout; 2] {
        [&self.global_layout, &self.object_layout]
    }

    pub fn global_bind_group(&self) -> &wgpu::BindGroup {
        &self.global_bind_group
    }

    /// Bind group for one node's uniform buffer.
    pub fn object_bind_group(&self, device: &wgpu::Device, ubo: &ObjectUBO) -> wgpu::BindGroup {
        uniform_bind_group(
            device,
            &self.object_layout,
            ubo.binding_resource(),
            "Object Bind Group",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUBOContent>() % 16, 0);
    }

    #[test]
    fn test_object_content_carries_material() {
        let material = Material::from_hex("red", 0xff0000, 0.0, 0.6);
        let content = ObjectUBOContent::new(Matrix4::identity(), &material);
        assert_eq!(content.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(content.roughness, 0.6);
        assert_eq!(content.normal_matrix, content.model);
    }
}
