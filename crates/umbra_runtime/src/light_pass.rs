//! Multi-Light Color Passes
//!
//! Executes the color half of a frame schedule: one pass per enabled
//! light, the first opaque with a cleared target, the rest blended
//! additively over the preserved depth buffer. Shadow visibility is
//! sampled from the shadow target through a comparison sampler.

use umbra_render::{DepthCompare, FrameSchedule, GpuLight, GpuShadow, PassBlend, MAX_LIGHTS};
use wgpu::util::DeviceExt;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingResource, BindingType, BlendComponent, BlendFactor,
    BlendOperation, BlendState, Buffer, BufferBindingType, BufferUsages, Color, ColorTargetState,
    ColorWrites, CompareFunction, DepthBiasState, DepthStencilState, Device, Extent3d, Face,
    FragmentState, FrontFace, LoadOp, MultisampleState, Operations, PipelineCompilationOptions,
    PipelineLayoutDescriptor, PolygonMode, PrimitiveState, PrimitiveTopology, Queue,
    RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor,
    RenderPipeline, RenderPipelineDescriptor, SamplerBindingType, ShaderStages, StencilState,
    StoreOp, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureView, TextureViewDimension, VertexState,
};

use crate::mesh::{vertex_layout, GpuMesh, MeshInstance};
use crate::shadow_pass::ShadowTarget;

/// Per-frame shading uniforms
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 3],
    light_index: u32,
}

/// Per-draw object uniforms
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

/// Color pass renderer for the light compositing loop
pub struct LightPassRenderer {
    opaque_pipeline: RenderPipeline,
    additive_pipeline: RenderPipeline,

    frame_buffer: Buffer,
    lights_buffer: Buffer,
    shadows_buffer: Buffer,
    object_buffer: Buffer,

    scene_bind_group: BindGroup,
    object_bind_group: BindGroup,
    shadow_bind_group_layout: BindGroupLayout,

    depth_view: Option<TextureView>,
    depth_size: (u32, u32),
}

impl LightPassRenderer {
    pub fn new(device: &Device, format: TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lighting_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/lighting.wgsl").into()),
        });

        let uniform_entry = |binding| BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let scene_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("scene_layout"),
            entries: &[uniform_entry(0), uniform_entry(1), uniform_entry(2)],
        });

        let shadow_bind_group_layout =
            device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some("shadow_sampling_layout"),
                entries: &[
                    BindGroupLayoutEntry {
                        binding: 0,
                        visibility: ShaderStages::FRAGMENT,
                        ty: BindingType::Texture {
                            sample_type: TextureSampleType::Depth,
                            view_dimension: TextureViewDimension::D2Array,
                            multisampled: false,
                        },
                        count: None,
                    },
                    BindGroupLayoutEntry {
                        binding: 1,
                        visibility: ShaderStages::FRAGMENT,
                        ty: BindingType::Sampler(SamplerBindingType::Comparison),
                        count: None,
                    },
                ],
            });

        let object_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("object_layout"),
            entries: &[uniform_entry(0)],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("lighting_pipeline_layout"),
            bind_group_layouts: &[&scene_layout, &shadow_bind_group_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label, blend: Option<BlendState>, depth_write, compare| {
            device.create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[vertex_layout()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(ColorTargetState {
                        format,
                        blend,
                        write_mask: ColorWrites::ALL,
                    })],
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
                    depth_write_enabled: depth_write,
                    depth_compare: compare,
                    stencil: StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        // First light writes depth with a strict test; later lights
        // accumulate over the same surfaces with LessEqual.
        let opaque_pipeline = make_pipeline(
            "light_opaque_pipeline",
            Some(BlendState::REPLACE),
            true,
            CompareFunction::Less,
        );
        let additive_pipeline = make_pipeline(
            "light_additive_pipeline",
            Some(BlendState {
                color: BlendComponent {
                    src_factor: BlendFactor::One,
                    dst_factor: BlendFactor::One,
                    operation: BlendOperation::Add,
                },
                alpha: BlendComponent {
                    src_factor: BlendFactor::One,
                    dst_factor: BlendFactor::One,
                    operation: BlendOperation::Add,
                },
            }),
            false,
            CompareFunction::LessEqual,
        );

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms {
                view_proj: [[0.0; 4]; 4],
                camera_pos: [0.0; 3],
                light_index: 0,
            }),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light_array"),
            contents: bytemuck::cast_slice(&[GpuLight::default(); MAX_LIGHTS]),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let shadows_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shadow_array"),
            contents: bytemuck::cast_slice(&[GpuShadow::default(); MAX_LIGHTS]),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let object_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("object_uniforms"),
            contents: bytemuck::bytes_of(&ObjectUniforms {
                model: [[0.0; 4]; 4],
                color: [1.0; 4],
            }),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let scene_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &scene_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: shadows_buffer.as_entire_binding(),
                },
            ],
        });

        let object_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout: &object_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: object_buffer.as_entire_binding(),
            }],
        });

        Self {
            opaque_pipeline,
            additive_pipeline,
            frame_buffer,
            lights_buffer,
            shadows_buffer,
            object_buffer,
            scene_bind_group,
            object_bind_group,
            shadow_bind_group_layout,
            depth_view: None,
            depth_size: (0, 0),
        }
    }

    /// Create the sampling bind group for a shadow target
    pub fn create_shadow_bind_group(&self, device: &Device, target: &ShadowTarget) -> BindGroup {
        device.create_bind_group(&BindGroupDescriptor {
            label: Some("shadow_sampling_bind_group"),
            layout: &self.shadow_bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&target.array_view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&target.sampler),
                },
            ],
        })
    }

    fn ensure_depth(&mut self, device: &Device, size: (u32, u32)) {
        if self.depth_view.is_some() && self.depth_size == size {
            return;
        }

        let texture = device.create_texture(&TextureDescriptor {
            label: Some("scene_depth"),
            size: Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Depth32Float,
            usage: TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        self.depth_view = Some(texture.create_view(&Default::default()));
        self.depth_size = size;
    }

    /// Run every scheduled color pass into `target`
    ///
    /// An empty schedule still clears the target. Light and shadow
    /// uniform arrays are uploaded once; each pass rewrites only the
    /// per-pass frame uniforms.
    pub fn render(
        &mut self,
        device: &Device,
        queue: &Queue,
        target: &TextureView,
        size: (u32, u32),
        schedule: &FrameSchedule,
        shadow_bind_group: &BindGroup,
        meshes: &[GpuMesh],
        instances: &[MeshInstance],
    ) {
        self.ensure_depth(device, size);
        let depth_view = match &self.depth_view {
            Some(view) => view,
            None => return,
        };

        if schedule.lights.len() > MAX_LIGHTS {
            log::warn!(
                "{} lights scheduled, uniform arrays hold {}; extra lights dropped",
                schedule.lights.len(),
                MAX_LIGHTS
            );
        }

        let mut lights = [GpuLight::default(); MAX_LIGHTS];
        for (slot, light) in lights.iter_mut().zip(&schedule.lights) {
            *slot = *light;
        }
        queue.write_buffer(&self.lights_buffer, 0, bytemuck::cast_slice(&lights));

        let mut shadows = [GpuShadow::default(); MAX_LIGHTS];
        for (slot, shadow) in shadows.iter_mut().zip(&schedule.shadows) {
            *slot = *shadow;
        }
        queue.write_buffer(&self.shadows_buffer, 0, bytemuck::cast_slice(&shadows));

        if schedule.is_empty() {
            self.clear_only(device, queue, target, depth_view);
            return;
        }

        for pass in &schedule.color_passes {
            if pass.light_index >= MAX_LIGHTS {
                continue;
            }

            queue.write_buffer(
                &self.frame_buffer,
                0,
                bytemuck::bytes_of(&FrameUniforms {
                    view_proj: schedule.frame.view_proj,
                    camera_pos: schedule.frame.camera_position,
                    light_index: pass.light_index as u32,
                }),
            );

            let pipeline = match pass.blend {
                PassBlend::Opaque => &self.opaque_pipeline,
                PassBlend::Additive => &self.additive_pipeline,
            };
            debug_assert!(matches!(
                (pass.blend, pass.depth_compare),
                (PassBlend::Opaque, DepthCompare::Less)
                    | (PassBlend::Additive, DepthCompare::LessEqual)
            ));

            // One submit per caster: the object uniform is rewritten
            // between draws.
            let mut first_draw = true;
            for instance in instances {
                let Some(mesh) = meshes.get(instance.mesh) else {
                    log::error!("instance references missing mesh {}", instance.mesh);
                    continue;
                };

                queue.write_buffer(
                    &self.object_buffer,
                    0,
                    bytemuck::bytes_of(&ObjectUniforms {
                        model: instance.model,
                        color: instance.color,
                    }),
                );

                let clear = pass.clear && first_draw;
                first_draw = false;

                let mut encoder = device.create_command_encoder(&Default::default());
                {
                    let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                        label: Some("light_pass"),
                        color_attachments: &[Some(RenderPassColorAttachment {
                            view: target,
                            resolve_target: None,
                            ops: Operations {
                                load: if clear {
                                    LoadOp::Clear(Color::BLACK)
                                } else {
                                    LoadOp::Load
                                },
                                store: StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                            view: depth_view,
                            depth_ops: Some(Operations {
                                load: if clear { LoadOp::Clear(1.0) } else { LoadOp::Load },
                                store: StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });

                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
                    render_pass.set_bind_group(1, shadow_bind_group, &[]);
                    render_pass.set_bind_group(2, &self.object_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
                queue.submit(std::iter::once(encoder.finish()));
            }

            // A clearing pass with no geometry still clears.
            if pass.clear && first_draw {
                self.clear_only(device, queue, target, depth_view);
            }
        }
    }

    fn clear_only(
        &self,
        device: &Device,
        queue: &Queue,
        target: &TextureView,
        depth_view: &TextureView,
    ) {
        let mut encoder = device.create_command_encoder(&Default::default());
        {
            let _clear = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("light_clear"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color::BLACK),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: depth_view,
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
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes() {
        // WGSL uniform structs: 16-byte multiples, matching the shader.
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 80);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 80);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
    }

    #[test]
    fn test_light_array_upload_size() {
        let lights = [GpuLight::default(); MAX_LIGHTS];
        assert_eq!(bytemuck::cast_slice::<_, u8>(&lights).len(), MAX_LIGHTS * 80);

        let shadows = [GpuShadow::default(); MAX_LIGHTS];
        assert_eq!(
            bytemuck::cast_slice::<_, u8>(&shadows).len(),
            MAX_LIGHTS * 448
        );
    }
}
