//! # umbra_runtime - wgpu Shadow Rendering Backend
//!
//! Executes the [`FrameSchedule`](umbra_render::FrameSchedule) produced
//! by `umbra_render` against a wgpu device:
//!
//! - Depth-only shadow rasterization into a `Depth32Float` texture
//!   array, one layer per shadow view, with slope-scaled depth bias
//! - Per-light color passes composited additively over an opaque base
//! - Shadow sampling through a comparison sampler, mirroring the CPU
//!   reference in `umbra_render::shadow::sampling`
//!
//! The backend is headless-friendly: [`GpuContext::new_headless`] brings
//! up a device without a surface, and all render targets are plain
//! textures the caller can read back or present.

use std::sync::Arc;

use thiserror::Error;
use wgpu::{
    Backends, Device, DeviceDescriptor, Features, Instance, InstanceDescriptor, Limits,
    MemoryHints, PowerPreference, Queue, RequestAdapterOptions,
};

pub mod light_pass;
pub mod mesh;
pub mod shadow_pass;

pub use light_pass::LightPassRenderer;
pub use mesh::{generate_cube, generate_plane, GpuMesh, MeshInstance};
pub use shadow_pass::{ShadowPassRenderer, ShadowTarget};

/// Errors from backend setup and rendering
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter found")]
    AdapterNotFound,

    #[error("device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Shared GPU device and queue
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
}

impl GpuContext {
    /// Bring up a device without a surface
    pub fn new_headless() -> Result<Self, RenderError> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Result<Self, RenderError> {
        let instance = Instance::new(InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterNotFound)?;

        log::info!("using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("umbra_device"),
                    required_features: Features::empty(),
                    required_limits: Limits::default(),
                    memory_hints: MemoryHints::default(),
                },
                None,
            )
            .await?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }
}
