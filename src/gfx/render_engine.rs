//! # Render Engine
//!
//! Draws every visible mesh node of a [`SceneGraph`] with a single lit
//! pipeline, then hands the frame to an optional UI callback.
//!
//! GPU buffers are created lazily the first time a mesh node is seen. Nodes
//! are never removed from the graph, so the cache only grows; per-node uniforms
//! are refreshed each frame from the node's world matrix and material, which is
//! how pivot rotations, panel scaling and light switches reach the screen.

use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::camera::CameraUniform;
use super::resources::global_bindings::{
    update_global_ubo, GlobalBindings, GlobalUBO, LightConfig, ObjectUBO, ObjectUBOContent,
};
use super::resources::material::Material;
use super::resources::texture_resource::TextureResource;
use super::scene::{MeshData, NodeId, SceneGraph, Vertex3D};
use crate::error::ViewerError;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.2,
    b: 0.3,
    a: 1.0,
};

/// GPU resources for one mesh node.
struct GpuNode {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    ubo: ObjectUBO,
    bind_group: wgpu::BindGroup,
}

impl GpuNode {
    fn upload(
        device: &wgpu::Device,
        bindings: &GlobalBindings,
        name: &str,
        mesh: &MeshData,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Vertex Buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Index Buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let ubo = ObjectUBO::new(device);
        let bind_group = bindings.object_bind_group(device, &ubo);

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            ubo,
            bind_group,
        }
    }
}

/// Render pass helper for cached node buffers.
trait DrawNode<'a> {
    fn draw_node(&mut self, node: &'a GpuNode);
}

impl<'a> DrawNode<'a> for wgpu::RenderPass<'_> {
    fn draw_node(&mut self, node: &'a GpuNode) {
        if node.index_count == 0 {
            return;
        }
        self.set_bind_group(1, &node.bind_group, &[]);
        self.set_vertex_buffer(0, node.vertex_buffer.slice(..));
        self.set_index_buffer(node.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..node.index_count, 0, 0..1);
    }
}

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: wgpu::TextureFormat,

    pipeline: wgpu::RenderPipeline,

    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    light: LightConfig,

    nodes: HashMap<NodeId, GpuNode>,
    default_material: Material,
}

impl RenderEngine {
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine, ViewerError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &global_bindings.layouts(),
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // OBJ exports mix windings; the shader lights both sides.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        Ok(RenderEngine {
            surface,
            device: device.into(),
            queue: queue.into(),
            config,
            depth_texture,
            format,
            pipeline,
            global_ubo,
            global_bindings,
            light: LightConfig::default(),
            nodes: HashMap::new(),
            default_material: Material::default(),
        })
    }

    /// Uploads new mesh nodes, refreshes per-node uniforms and returns the
    /// nodes to draw this frame.
    fn sync_scene(&mut self, scene: &SceneGraph) -> Vec<NodeId> {
        let mut visible = Vec::new();
        for id in scene.traverse(scene.root()) {
            let Some(node) = scene.node(id) else { continue };
            let Some(mesh) = node.mesh.as_ref() else { continue };
            if !scene.is_visible_in_tree(id) {
                continue;
            }

            let gpu = self.nodes.entry(id).or_insert_with(|| {
                log::debug!("Uploading mesh '{}' ({} triangles)", node.name, mesh.triangle_count());
                GpuNode::upload(&self.device, &self.global_bindings, &node.name, mesh)
            });
            let material = node.material.as_ref().unwrap_or(&self.default_material);
            let content = ObjectUBOContent::new(scene.world_matrix(id), material);
            gpu.ubo.update_content(&self.queue, content);
            visible.push(id);
        }
        visible
    }

    /// Renders one frame of `scene` and then runs `ui_callback` against the
    /// same surface texture.
    ///
    /// A lost or outdated surface is reconfigured and the frame is skipped.
    pub fn render_frame<F>(
        &mut self,
        scene: &SceneGraph,
        ui_callback: Option<F>,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let draw_list = self.sync_scene(scene);

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, self.global_bindings.global_bind_group(), &[]);

            for id in &draw_list {
                if let Some(gpu) = self.nodes.get(id) {
                    render_pass.draw_node(gpu);
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    pub fn render_frame_with_ui<F>(
        &mut self,
        scene: &SceneGraph,
        ui_callback: F,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.render_frame(scene, Some(ui_callback))
    }

    /// Pushes this frame's camera into the global uniforms.
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        update_global_ubo(&mut self.global_ubo, &self.queue, camera_uniform, self.light);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
