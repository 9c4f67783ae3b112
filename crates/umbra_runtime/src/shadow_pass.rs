//! Shadow Rasterization Pass
//!
//! Renders scene depth from each shadow view into its depth array
//! layer. Depth bias is fixed at pipeline creation in wgpu, so pipelines
//! are cached per (constant, slope) bias pair; lights sharing bias
//! settings share a pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use umbra_render::FrameSchedule;
use wgpu::util::DeviceExt;
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, Buffer, BufferBindingType,
    BufferUsages, CompareFunction, DepthBiasState, DepthStencilState, Device, Extent3d, Face,
    FilterMode, FragmentState, FrontFace, LoadOp, MultisampleState, Operations,
    PipelineCompilationOptions, PipelineLayout, PipelineLayoutDescriptor, PolygonMode,
    PrimitiveState, PrimitiveTopology, Queue, RenderPassDepthStencilAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, Sampler, SamplerDescriptor,
    ShaderModule, ShaderStages, StencilState, StoreOp, Texture,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, TextureViewDimension, VertexState,
};

use crate::mesh::{vertex_layout, GpuMesh, MeshInstance};

/// Depth bias pipeline cache key: (constant units, slope factor bits)
type BiasKey = (i32, u32);

/// Per-draw shadow uniforms
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ShadowObject {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
}

/// Depth texture array plus the views and sampler the passes need
pub struct ShadowTarget {
    pub texture: Texture,

    /// One render-attachment view per layer
    pub layer_views: Vec<TextureView>,

    /// Whole-array view for sampling in the color passes
    pub array_view: TextureView,

    /// Comparison sampler (LessEqual, linear)
    pub sampler: Sampler,

    pub resolution: u32,
    pub layer_count: u32,
}

impl ShadowTarget {
    /// Create the depth array and its views
    pub fn new(device: &Device, resolution: u32, layer_count: u32) -> Self {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("shadow_map_array"),
            size: Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: layer_count,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Depth32Float,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let layer_views = (0..layer_count)
            .map(|layer| {
                texture.create_view(&TextureViewDescriptor {
                    label: Some("shadow_layer"),
                    dimension: Some(TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let array_view = texture.create_view(&TextureViewDescriptor {
            label: Some("shadow_array"),
            dimension: Some(TextureViewDimension::D2Array),
            ..Default::default()
        });

        // Comparison sampler for PCF shadow sampling
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Nearest,
            compare: Some(CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            texture,
            layer_views,
            array_view,
            sampler,
            resolution,
            layer_count,
        }
    }
}

/// Depth-only shadow pass renderer with a bias-keyed pipeline cache
pub struct ShadowPassRenderer {
    shader: ShaderModule,
    bind_group_layout: BindGroupLayout,
    pipeline_layout: PipelineLayout,
    pipelines: Mutex<HashMap<BiasKey, Arc<RenderPipeline>>>,
    uniform_buffer: Buffer,
    bind_group: BindGroup,
}

impl ShadowPassRenderer {
    pub fn new(device: &Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shadow.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("shadow_object_layout"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shadow_object_buffer"),
            contents: bytemuck::bytes_of(&ShadowObject {
                view_proj: [[0.0; 4]; 4],
                model: [[0.0; 4]; 4],
            }),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("shadow_object_bind_group"),
            layout: &bind_group_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: Mutex::new(HashMap::new()),
            uniform_buffer,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &BindGroupLayout {
        &self.bind_group_layout
    }

    /// Get or create the pipeline for a bias pair
    ///
    /// The constant bias is quantized to whole hardware units; the slope
    /// factor is keyed by its exact bit pattern.
    fn pipeline_for(&self, device: &Device, bias: f32, slope_bias: f32) -> Arc<RenderPipeline> {
        let key: BiasKey = (bias as i32, slope_bias.to_bits());
        let mut cache = self.pipelines.lock();

        if let Some(pipeline) = cache.get(&key) {
            return pipeline.clone();
        }

        log::debug!("creating shadow pipeline, bias {} slope {}", bias, slope_bias);
        let pipeline = Arc::new(device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: VertexState {
                module: &self.shader,
                entry_point: "vs_main",
                buffers: &[vertex_layout()],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &self.shader,
                entry_point: "fs_main",
                targets: &[], // Depth only
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: Some(Face::Back),
                unclipped_depth: false,
                polygon_mode: PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState {
                    constant: bias as i32,
                    slope_scale: slope_bias,
                    clamp: 0.0,
                },
            }),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        }));

        cache.insert(key, pipeline.clone());
        pipeline
    }

    /// Render every scheduled shadow view
    ///
    /// Each layer is cleared to the far plane first, so a view with no
    /// casters still produces a fully-lit map. A pass referencing a
    /// layer outside the target is logged and skipped.
    pub fn render(
        &self,
        device: &Device,
        queue: &Queue,
        target: &ShadowTarget,
        schedule: &FrameSchedule,
        meshes: &[GpuMesh],
        instances: &[MeshInstance],
    ) {
        for pass in &schedule.shadow_passes {
            if pass.layer >= target.layer_count {
                log::error!(
                    "shadow pass for light {} references layer {} of {}, skipping",
                    pass.light_index,
                    pass.layer,
                    target.layer_count
                );
                continue;
            }
            let layer_view = &target.layer_views[pass.layer as usize];

            // Clear the layer to far depth.
            let mut encoder = device.create_command_encoder(&Default::default());
            {
                let _clear = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("shadow_clear"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                        view: layer_view,
                        depth_ops: Some(Operations {
                            load: LoadOp::Clear(1.0),
                            store: StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            }
            queue.submit(std::iter::once(encoder.finish()));

            let pipeline = self.pipeline_for(device, pass.bias, pass.slope_bias);

            // One submit per caster: the object uniform is rewritten
            // between draws.
            for instance in instances {
                let Some(mesh) = meshes.get(instance.mesh) else {
                    log::error!("instance references missing mesh {}", instance.mesh);
                    continue;
                };

                queue.write_buffer(
                    &self.uniform_buffer,
                    0,
                    bytemuck::bytes_of(&ShadowObject {
                        view_proj: pass.view_proj,
                        model: instance.model,
                    }),
                );

                let mut encoder = device.create_command_encoder(&Default::default());
                {
                    let mut shadow_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                        label: Some("shadow_pass"),
                        color_attachments: &[],
                        depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                            view: layer_view,
                            depth_ops: Some(Operations {
                                load: LoadOp::Load, // Keep previous casters
                                store: StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });

                    shadow_pass.set_pipeline(&pipeline);
                    shadow_pass.set_bind_group(0, &self.bind_group, &[]);
                    shadow_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    shadow_pass
                        .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    shadow_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
                queue.submit(std::iter::once(encoder.finish()));
            }
        }
    }
}
