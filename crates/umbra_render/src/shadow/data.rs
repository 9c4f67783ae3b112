//! GPU Shadow Data Structures
//!
//! GPU-compatible data structures for the shading pass. All structures
//! are bytemuck Pod/Zeroable for direct GPU upload, with layouts that
//! satisfy WGSL uniform rules (16-byte alignment, vec4 array strides).

use serde::{Deserialize, Serialize};

use super::set::{ShadowProjection, ShadowSet};
use super::transform::CUBE_FACE_COUNT;
use crate::light::Light;

/// Maximum shadow views per light (the six cube faces)
pub const MAX_SHADOW_VIEWS: usize = CUBE_FACE_COUNT;

/// Maximum lights per frame in the shading uniform arrays
pub const MAX_LIGHTS: usize = 16;

/// GPU light record (uniform buffer element)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    /// World position (unused for ambient and directional)
    pub position: [f32; 3],

    /// Light kind (0 ambient, 1 directional, 2 point, 3 spot)
    pub kind: u32,

    /// Travel direction (unused for ambient and point)
    pub direction: [f32; 3],

    /// Intensity multiplier
    pub intensity: f32,

    /// Light color (linear RGB)
    pub color: [f32; 3],

    /// Index into the shadow uniform array (-1 = no shadow)
    pub shadow_index: i32,

    /// Attenuation coefficients [constant, linear, quadratic]
    pub attenuation: [f32; 3],

    /// cos(inner cone half-angle), spot only
    pub cos_inner: f32,

    /// cos(outer cone half-angle), spot only
    pub cos_outer: f32,

    /// Whether the light participates (0 or 1)
    pub enabled: u32,

    /// Padding to 16-byte stride
    pub _pad: [f32; 2],
}

impl GpuLight {
    /// Pack a light descriptor for upload
    pub fn from_light(light: &Light, shadow_index: i32) -> Self {
        let enabled = if light.enabled() { 1 } else { 0 };
        match light {
            Light::Ambient(l) => Self {
                kind: 0,
                color: l.color,
                intensity: l.intensity,
                shadow_index: -1,
                enabled,
                ..Default::default()
            },
            Light::Directional(l) => Self {
                kind: 1,
                direction: l.direction,
                color: l.color,
                intensity: l.intensity,
                shadow_index,
                enabled,
                ..Default::default()
            },
            Light::Point(l) => Self {
                kind: 2,
                position: l.position,
                color: l.color,
                intensity: l.intensity,
                attenuation: l.attenuation,
                shadow_index,
                enabled,
                ..Default::default()
            },
            Light::Spot(l) => Self {
                kind: 3,
                position: l.position,
                direction: l.direction,
                color: l.color,
                intensity: l.intensity,
                attenuation: l.attenuation,
                cos_inner: l.inner_cone.cos(),
                cos_outer: l.outer_cone.cos(),
                shadow_index,
                enabled,
                ..Default::default()
            },
        }
    }
}

/// GPU shadow record for one light (uniform buffer element)
///
/// Layer indices are packed as two ivec4s because WGSL uniform arrays
/// require a 16-byte element stride.
#[repr(C)]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuShadow {
    /// View-projection matrix per view (view order per projection kind)
    pub matrices: [[[f32; 4]; 4]; MAX_SHADOW_VIEWS],

    /// Depth array layer per view, packed 4-wide
    pub layers: [[i32; 4]; 2],

    /// Cascade half-extents, zero-padded
    pub extents: [f32; 4],

    /// Number of active views (0 = disabled)
    pub view_count: u32,

    /// Projection kind (0 spot, 1 point, 2 cascade)
    pub kind: u32,

    /// World size of one texel in the first view's footprint
    pub texel_size: f32,

    /// Shadow strength (0 = no shadow, 1 = full shadow)
    pub strength: f32,
}

impl Default for GpuShadow {
    fn default() -> Self {
        Self {
            matrices: [[[0.0; 4]; 4]; MAX_SHADOW_VIEWS],
            layers: [[-1; 4]; 2],
            extents: [0.0; 4],
            view_count: 0,
            kind: 0,
            texel_size: 0.0,
            strength: 1.0,
        }
    }
}

impl GpuShadow {
    /// Create a disabled shadow record
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Check if this shadow record is active
    pub fn is_enabled(&self) -> bool {
        self.view_count > 0
    }

    /// Pack a shadow set for upload
    pub fn from_set(set: &ShadowSet) -> Self {
        let mut gpu = Self {
            kind: match set.projection {
                ShadowProjection::Spot => 0,
                ShadowProjection::Point => 1,
                ShadowProjection::Cascade => 2,
            },
            view_count: set.views.len().min(MAX_SHADOW_VIEWS) as u32,
            texel_size: set.texel_size(),
            ..Default::default()
        };
        gpu.extents = set.extents;

        for (i, view) in set.views.iter().take(MAX_SHADOW_VIEWS).enumerate() {
            gpu.matrices[i] = view.view_proj;
            gpu.layers[i / 4][i % 4] = view.layer as i32;
        }
        gpu
    }

    /// Layer index for a view (unpacks the ivec4 pair)
    pub fn layer(&self, view: usize) -> i32 {
        self.layers[view / 4][view % 4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::{
        CascadeShadowSettings, DirectionalLight, PointLight, ProjectedShadowSettings, SpotLight,
    };
    use crate::shadow::pool::ShadowMapPool;

    #[test]
    fn test_gpu_light_size() {
        // Verify GPU alignment
        assert_eq!(core::mem::size_of::<GpuLight>(), 80);
        assert_eq!(core::mem::size_of::<GpuLight>() % 16, 0);
    }

    #[test]
    fn test_gpu_shadow_size() {
        // 384 matrices + 32 layers + 16 extents + 16 scalars
        assert_eq!(core::mem::size_of::<GpuShadow>(), 448);
        assert_eq!(core::mem::size_of::<GpuShadow>() % 16, 0);
    }

    #[test]
    fn test_gpu_shadow_disabled() {
        let shadow = GpuShadow::disabled();
        assert!(!shadow.is_enabled());
        assert_eq!(shadow.layer(0), -1);
    }

    #[test]
    fn test_gpu_light_spot_encoding() {
        let light = Light::Spot(
            SpotLight::new([1.0, 2.0, 3.0], [0.0, -1.0, 0.0]).with_cone(0.3, 0.5),
        );
        let gpu = GpuLight::from_light(&light, 2);

        assert_eq!(gpu.kind, 3);
        assert_eq!(gpu.position, [1.0, 2.0, 3.0]);
        assert_eq!(gpu.shadow_index, 2);
        assert!((gpu.cos_outer - 0.5f32.cos()).abs() < 1e-6);
        assert_eq!(gpu.enabled, 1);
    }

    #[test]
    fn test_gpu_light_disabled_encoding() {
        let mut light = Light::Point(PointLight::new([0.0; 3]));
        light.set_enabled(false);
        let gpu = GpuLight::from_light(&light, -1);

        assert_eq!(gpu.kind, 2);
        assert_eq!(gpu.enabled, 0);
        assert_eq!(gpu.shadow_index, -1);
    }

    #[test]
    fn test_gpu_shadow_from_point_set() {
        let mut pool = ShadowMapPool::new(1024, 8);
        let light = Light::Point(
            PointLight::new([0.0; 3]).with_shadow(ProjectedShadowSettings::default()),
        );
        let alloc = pool.allocate(1, 6, 1024).unwrap();
        let set = crate::shadow::set::ShadowSet::build(&light, &alloc, [0.0; 3]).unwrap();

        let gpu = GpuShadow::from_set(&set);
        assert_eq!(gpu.kind, 1);
        assert_eq!(gpu.view_count, 6);

        // Layer packing survives the ivec4 split.
        for i in 0..6 {
            assert_eq!(gpu.layer(i), set.views[i].layer as i32);
        }
        assert_eq!(gpu.matrices[0], set.views[0].view_proj);
    }

    #[test]
    fn test_gpu_shadow_from_cascade_set() {
        let mut pool = ShadowMapPool::new(2048, 8);
        let light = Light::Directional(DirectionalLight::new([0.0, -1.0, 0.0]).with_shadow(
            CascadeShadowSettings::default().with_cascades(&[10.0, 30.0]),
        ));
        let alloc = pool.allocate(1, 2, 2048).unwrap();
        let set = crate::shadow::set::ShadowSet::build(&light, &alloc, [0.0; 3]).unwrap();

        let gpu = GpuShadow::from_set(&set);
        assert_eq!(gpu.kind, 2);
        assert_eq!(gpu.view_count, 2);
        assert_eq!(gpu.extents, [10.0, 30.0, 0.0, 0.0]);
        assert!((gpu.texel_size - 20.0 / 2048.0).abs() < 1e-7);

        // Unused views stay disabled.
        assert_eq!(gpu.layer(2), -1);
    }

    #[test]
    fn test_gpu_shadow_bytes() {
        let gpu = GpuShadow::disabled();
        let bytes = bytemuck::bytes_of(&gpu);
        assert_eq!(bytes.len(), 448);
    }
}
