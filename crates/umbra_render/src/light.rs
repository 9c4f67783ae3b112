//! Light Descriptors
//!
//! Tagged light records with per-variant shadow settings. Each variant
//! carries only the fields that apply to it; shadow configuration is an
//! `Option` on the variants that can cast shadows.
//!
//! Lights are created once at scene start and mutated in place between
//! frames (enabled flags, bias parameters). Geometric validity of the
//! configuration (`near < far`, `inner_cone <= outer_cone`, non-empty
//! cascades) is a caller contract and is not checked here.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::shadow::transform::MAX_CASCADES;

/// Light variant discriminant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
    Spot,
}

/// A scene light
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Light {
    Ambient(AmbientLight),
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl Light {
    /// Get the variant discriminant
    pub fn kind(&self) -> LightKind {
        match self {
            Self::Ambient(_) => LightKind::Ambient,
            Self::Directional(_) => LightKind::Directional,
            Self::Point(_) => LightKind::Point,
            Self::Spot(_) => LightKind::Spot,
        }
    }

    /// Whether this light participates in the frame
    pub fn enabled(&self) -> bool {
        match self {
            Self::Ambient(l) => l.enabled,
            Self::Directional(l) => l.enabled,
            Self::Point(l) => l.enabled,
            Self::Spot(l) => l.enabled,
        }
    }

    /// Enable or disable the light
    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            Self::Ambient(l) => l.enabled = enabled,
            Self::Directional(l) => l.enabled = enabled,
            Self::Point(l) => l.enabled = enabled,
            Self::Spot(l) => l.enabled = enabled,
        }
    }

    /// Whether shadow casting is configured for this light
    pub fn has_shadow(&self) -> bool {
        match self {
            Self::Ambient(_) => false,
            Self::Directional(l) => l.shadow.is_some(),
            Self::Point(l) => l.shadow.is_some(),
            Self::Spot(l) => l.shadow.is_some(),
        }
    }

    /// Number of shadow sub-views this light requires
    ///
    /// 1 for spot, 6 for point (cube faces), cascade count for
    /// directional, 0 when no shadow is configured.
    pub fn shadow_view_count(&self) -> usize {
        match self {
            Self::Ambient(_) => 0,
            Self::Directional(l) => l.shadow.as_ref().map_or(0, |s| s.cascades.len()),
            Self::Point(l) => l.shadow.as_ref().map_or(0, |_| 6),
            Self::Spot(l) => l.shadow.as_ref().map_or(0, |_| 1),
        }
    }

    /// Shadow map resolution, if shadow casting is configured
    pub fn shadow_resolution(&self) -> Option<u32> {
        match self {
            Self::Ambient(_) => None,
            Self::Directional(l) => l.shadow.as_ref().map(|s| s.resolution),
            Self::Point(l) => l.shadow.as_ref().map(|s| s.resolution),
            Self::Spot(l) => l.shadow.as_ref().map(|s| s.resolution),
        }
    }

    /// Depth bias parameters (constant, slope-scaled), if shadow casting
    /// is configured
    pub fn shadow_bias(&self) -> Option<(f32, f32)> {
        match self {
            Self::Ambient(_) => None,
            Self::Directional(l) => l.shadow.as_ref().map(|s| (s.bias, s.slope_bias)),
            Self::Point(l) => l.shadow.as_ref().map(|s| (s.bias, s.slope_bias)),
            Self::Spot(l) => l.shadow.as_ref().map(|s| (s.bias, s.slope_bias)),
        }
    }
}

/// Uniform ambient term
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AmbientLight {
    /// Light color (linear RGB)
    pub color: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
    /// Whether the light participates in the frame
    pub enabled: bool,
}

impl AmbientLight {
    /// Create a new ambient light
    pub fn new(color: [f32; 3], intensity: f32) -> Self {
        Self {
            color,
            intensity,
            enabled: true,
        }
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::new([1.0, 1.0, 1.0], 0.1)
    }
}

/// Directional (sun-style) light with optional cascaded shadows
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction the light travels (normalized, world space)
    pub direction: [f32; 3],
    /// Light color (linear RGB)
    pub color: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
    /// Whether the light participates in the frame
    pub enabled: bool,
    /// Cascaded shadow configuration (None = no shadows)
    pub shadow: Option<CascadeShadowSettings>,
}

impl DirectionalLight {
    /// Create a new directional light
    pub fn new(direction: [f32; 3]) -> Self {
        Self {
            direction: normalize(direction),
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            enabled: true,
            shadow: None,
        }
    }

    /// Set color and intensity
    pub fn with_color(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    /// Enable shadow casting
    pub fn with_shadow(mut self, shadow: CascadeShadowSettings) -> Self {
        self.shadow = Some(shadow);
        self
    }
}

/// Omnidirectional light with optional cube shadows
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PointLight {
    /// World position
    pub position: [f32; 3],
    /// Light color (linear RGB)
    pub color: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
    /// Attenuation coefficients [constant, linear, quadratic]
    pub attenuation: [f32; 3],
    /// Whether the light participates in the frame
    pub enabled: bool,
    /// Cube shadow configuration (None = no shadows)
    pub shadow: Option<ProjectedShadowSettings>,
}

impl PointLight {
    /// Create a new point light
    pub fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            attenuation: [1.0, 0.09, 0.032],
            enabled: true,
            shadow: None,
        }
    }

    /// Set color and intensity
    pub fn with_color(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    /// Set attenuation coefficients
    pub fn with_attenuation(mut self, constant: f32, linear: f32, quadratic: f32) -> Self {
        self.attenuation = [constant, linear, quadratic];
        self
    }

    /// Enable shadow casting
    pub fn with_shadow(mut self, shadow: ProjectedShadowSettings) -> Self {
        self.shadow = Some(shadow);
        self
    }
}

/// Cone light with optional single-frustum shadows
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpotLight {
    /// World position
    pub position: [f32; 3],
    /// Direction the light travels (normalized, world space)
    pub direction: [f32; 3],
    /// Light color (linear RGB)
    pub color: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
    /// Attenuation coefficients [constant, linear, quadratic]
    pub attenuation: [f32; 3],
    /// Inner cone half-angle (radians); full brightness inside
    pub inner_cone: f32,
    /// Outer cone half-angle (radians); `inner_cone <= outer_cone`
    pub outer_cone: f32,
    /// Whether the light participates in the frame
    pub enabled: bool,
    /// Shadow configuration (None = no shadows)
    pub shadow: Option<ProjectedShadowSettings>,
}

impl SpotLight {
    /// Create a new spot light
    pub fn new(position: [f32; 3], direction: [f32; 3]) -> Self {
        Self {
            position,
            direction: normalize(direction),
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            attenuation: [1.0, 0.09, 0.032],
            inner_cone: 25.0_f32.to_radians(),
            outer_cone: 35.0_f32.to_radians(),
            enabled: true,
            shadow: None,
        }
    }

    /// Set cone half-angles in radians
    pub fn with_cone(mut self, inner: f32, outer: f32) -> Self {
        self.inner_cone = inner;
        self.outer_cone = outer;
        self
    }

    /// Set color and intensity
    pub fn with_color(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    /// Enable shadow casting
    pub fn with_shadow(mut self, shadow: ProjectedShadowSettings) -> Self {
        self.shadow = Some(shadow);
        self
    }
}

/// Cascaded shadow settings for directional lights
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CascadeShadowSettings {
    /// Half-extents of each cascade's orthographic footprint, ordered
    /// near-to-far (length 1..=[`MAX_CASCADES`])
    pub cascades: Vec<f32>,
    /// Depth range of the shadow volume behind the reference camera
    pub distance: f32,
    /// Shadow map resolution (square)
    pub resolution: u32,
    /// Constant depth bias (polygon offset units)
    pub bias: f32,
    /// Slope-scaled depth bias (polygon offset factor)
    pub slope_bias: f32,
}

impl Default for CascadeShadowSettings {
    fn default() -> Self {
        Self {
            cascades: alloc::vec![10.0, 30.0, 100.0, 250.0],
            distance: 500.0,
            resolution: 2048,
            bias: 2.0,
            slope_bias: 2.0,
        }
    }
}

impl CascadeShadowSettings {
    /// Set the cascade extents, truncating past [`MAX_CASCADES`]
    pub fn with_cascades(mut self, cascades: &[f32]) -> Self {
        self.cascades = cascades.iter().copied().take(MAX_CASCADES).collect();
        self
    }

    /// Set resolution
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Single-frustum shadow settings for point and spot lights
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectedShadowSettings {
    /// Near plane of the shadow projection
    pub near: f32,
    /// Far plane of the shadow projection
    pub far: f32,
    /// Shadow map resolution (square)
    pub resolution: u32,
    /// Constant depth bias (polygon offset units)
    pub bias: f32,
    /// Slope-scaled depth bias (polygon offset factor)
    pub slope_bias: f32,
}

impl Default for ProjectedShadowSettings {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
            resolution: 1024,
            bias: 2.0,
            slope_bias: 2.5,
        }
    }
}

impl ProjectedShadowSettings {
    /// Set the depth range
    pub fn with_range(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Set resolution
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Normalize a vec3, falling back to straight down for near-zero input
fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-6 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, -1.0, 0.0]
    }
}
