//! Shadow Mapping System
//!
//! Backend-agnostic shadow mapping infrastructure for directional, spot,
//! and point light shadows.
//!
//! # Architecture
//!
//! The shadow system is split into:
//!
//! - **Config**: Global shadow settings and quality presets
//! - **Transform**: Per-light-type view-projection derivation
//! - **Pool**: Shadow map layer allocation over a depth texture array
//! - **Set**: Per-light ordered (layer, matrix) shadow views
//! - **Sampling**: CPU reference of the depth-comparison visibility contract
//! - **Data**: GPU-ready uniform structures for the shading pass
//!
//! # Usage
//!
//! ```ignore
//! use umbra_render::shadow::*;
//!
//! let mut config = ShadowConfig::default();
//! config.validate();
//!
//! let mut pool = pool::ShadowMapPool::new(config.default_resolution, config.max_layers);
//!
//! // At light creation: allocate layers, build the shadow set.
//! let alloc = pool.allocate(light_id, light.shadow_view_count() as u32, 2048).unwrap();
//! let mut shadow_set = set::ShadowSet::build(&light, &alloc, camera_position).unwrap();
//!
//! // Per frame: recompute matrices in place (layers never move).
//! shadow_set.rebuild(&light, camera_position);
//!
//! // Pack for the GPU.
//! let gpu = data::GpuShadow::from_set(&shadow_set);
//! let bytes = bytemuck::bytes_of(&gpu);
//! ```

pub mod config;
pub mod data;
pub mod pool;
pub mod sampling;
pub mod set;
pub mod transform;

// Re-exports
pub use config::{ShadowConfig, ShadowQuality};
pub use data::{GpuLight, GpuShadow, MAX_LIGHTS, MAX_SHADOW_VIEWS};
pub use pool::{LightId, PoolStats, ShadowAllocation, ShadowMapPool, ShadowMapPoolState};
pub use sampling::{light_visibility, select_cascade, DepthImage, DepthSource};
pub use set::{ShadowProjection, ShadowSet, ShadowView};
pub use transform::{CUBE_FACE_COUNT, CUBE_FACE_DIRECTIONS, CUBE_FACE_UPS, MAX_CASCADES};
