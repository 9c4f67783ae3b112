//! # umbra_render - Multi-Light Shadow Mapping Core
//!
//! Backend-agnostic lighting and shadow infrastructure:
//! - Tagged light descriptors (ambient, directional, point, spot)
//! - Shadow transform derivation (spot frustum, cube faces, cascades)
//! - Shadow map layer allocation over a depth texture array
//! - CPU reference of the shadow sampling contract
//! - Per-frame pass scheduling with opaque/additive light compositing
//!
//! ## Architecture
//!
//! The core performs all per-frame mathematics and bookkeeping without
//! touching a GPU API. A backend (see `umbra_runtime`) consumes the
//! produced [`FrameSchedule`] and GPU-ready uniform structures.
//!
//! ```ignore
//! use umbra_render::prelude::*;
//!
//! let mut pool = ShadowMapPool::new(2048, 16);
//! let mut lights = vec![
//!     Light::Directional(
//!         DirectionalLight::new([0.3, -0.8, 0.2])
//!             .with_shadow(CascadeShadowSettings::default()),
//!     ),
//! ];
//!
//! // Allocate once at light creation.
//! let alloc = pool.allocate(0, lights[0].shadow_view_count() as u32, 2048).unwrap();
//! let mut set = ShadowSet::build(&lights[0], &alloc, camera_position).unwrap();
//!
//! // Per frame: rebuild matrices, then schedule passes.
//! set.rebuild(&lights[0], camera_position);
//! let schedule = scheduler.schedule(frame, &lights, &[Some(set.clone())]);
//! ```
//!
//! # Hot-Reload Support
//!
//! Light descriptors, shadow configuration and pool allocation state
//! support serde serialization. GPU resources are recreated by the
//! backend after reload.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod compositor;
pub mod light;
pub mod shadow;

// Re-exports
pub use light::{
    AmbientLight, CascadeShadowSettings, DirectionalLight, Light, LightKind, PointLight,
    ProjectedShadowSettings, SpotLight,
};

pub use shadow::config::{ShadowConfig, ShadowQuality};
pub use shadow::data::{GpuLight, GpuShadow, MAX_LIGHTS, MAX_SHADOW_VIEWS};
pub use shadow::pool::{LightId, PoolStats, ShadowAllocation, ShadowMapPool, ShadowMapPoolState};
pub use shadow::sampling::{
    light_visibility, project, select_cascade, DepthImage, DepthSource, ProjectedSample,
};
pub use shadow::set::{ShadowProjection, ShadowSet, ShadowView};
pub use shadow::transform::{
    cascade_view_projection, directional_view, find_up_vector, point_face_view_projection,
    spot_view_projection, CUBE_FACE_COUNT, CUBE_FACE_DIRECTIONS, CUBE_FACE_UPS, MAX_CASCADES,
};

pub use compositor::{
    ColorPassDesc, DepthCompare, FrameSchedule, FrameScheduler, PassBlend, ScheduleStats,
    ShadowPassDesc, ViewFrame,
};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::compositor::{
        ColorPassDesc, FrameSchedule, FrameScheduler, PassBlend, ShadowPassDesc, ViewFrame,
    };
    pub use crate::light::{
        AmbientLight, CascadeShadowSettings, DirectionalLight, Light, PointLight,
        ProjectedShadowSettings, SpotLight,
    };
    pub use crate::shadow::config::ShadowConfig;
    pub use crate::shadow::pool::ShadowMapPool;
    pub use crate::shadow::set::{ShadowSet, ShadowView};
}
