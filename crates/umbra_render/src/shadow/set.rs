//! Shadow Sets
//!
//! A shadow set is the per-light bundle the render backend consumes: an
//! ordered list of (layer, view-projection) pairs plus the parameters
//! shared by all of the light's views. View order is significant and
//! fixed per projection kind:
//!
//! - Cascade: near-to-far cascade order
//! - Point: cube face order -X, -Y, -Z, +X, +Y, +Z
//! - Spot: the single frustum
//!
//! Layers come from a [`ShadowAllocation`](super::pool::ShadowAllocation)
//! and never change after `build`; `rebuild` only refreshes matrices.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::light::Light;
use super::pool::{LightId, ShadowAllocation};
use super::transform::{
    cascade_view_projection, point_face_view_projection, spot_view_projection, CUBE_FACE_COUNT,
    MAX_CASCADES,
};

/// Shadow projection kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowProjection {
    /// Single perspective frustum (spot lights)
    Spot,
    /// Six cube-face frusta (point lights)
    Point,
    /// Orthographic cascades (directional lights)
    Cascade,
}

/// One shadow view: a depth layer and the matrix that fills it
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ShadowView {
    /// Depth array layer this view renders into
    pub layer: u32,
    /// Column-major view-projection matrix
    pub view_proj: [[f32; 4]; 4],
}

/// Per-light shadow views plus shared sampling parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadowSet {
    /// Owning light
    pub light_id: LightId,

    /// Projection kind (determines view order semantics)
    pub projection: ShadowProjection,

    /// Ordered views (1 spot, 6 point, 1-4 cascades)
    pub views: Vec<ShadowView>,

    /// Cascade half-extents, near-to-far, zero-padded
    /// (all zero for spot and point sets)
    pub extents: [f32; MAX_CASCADES],

    /// Shadow map resolution (square)
    pub resolution: u32,

    /// Constant depth bias (polygon offset units)
    pub bias: f32,

    /// Slope-scaled depth bias (polygon offset factor)
    pub slope_bias: f32,
}

impl ShadowSet {
    /// Build a shadow set for a light from its layer allocation
    ///
    /// Returns None for lights without shadow configuration, or when the
    /// allocation does not carry enough layers for the light's views.
    pub fn build(
        light: &Light,
        alloc: &ShadowAllocation,
        camera_position: [f32; 3],
    ) -> Option<Self> {
        let view_count = light.shadow_view_count();
        if view_count == 0 {
            return None;
        }
        if (alloc.view_count as usize) < view_count {
            log::warn!(
                "allocation for light {} has {} layers, needs {}",
                alloc.light_id,
                alloc.view_count,
                view_count
            );
            return None;
        }

        let (bias, slope_bias) = light.shadow_bias()?;
        let projection = match light {
            Light::Ambient(_) => return None,
            Light::Spot(_) => ShadowProjection::Spot,
            Light::Point(_) => ShadowProjection::Point,
            Light::Directional(_) => ShadowProjection::Cascade,
        };

        let mut set = Self {
            light_id: alloc.light_id,
            projection,
            views: alloc.layers[..view_count]
                .iter()
                .map(|&layer| ShadowView {
                    layer,
                    view_proj: [[0.0; 4]; 4],
                })
                .collect(),
            extents: [0.0; MAX_CASCADES],
            resolution: light.shadow_resolution()?,
            bias,
            slope_bias,
        };

        set.rebuild(light, camera_position);
        Some(set)
    }

    /// Recompute all view matrices in place
    ///
    /// Layers are untouched; call this every frame (or whenever the light
    /// or the reference camera moves). The computation is deterministic:
    /// unchanged inputs produce bit-identical matrices.
    pub fn rebuild(&mut self, light: &Light, camera_position: [f32; 3]) {
        match light {
            Light::Spot(l) => {
                if let (Some(settings), Some(view)) = (&l.shadow, self.views.first_mut()) {
                    view.view_proj = spot_view_projection(
                        l.position,
                        l.direction,
                        l.outer_cone,
                        settings.near,
                        settings.far,
                    );
                }
            }
            Light::Point(l) => {
                if let Some(settings) = &l.shadow {
                    for (face, view) in self.views.iter_mut().take(CUBE_FACE_COUNT).enumerate() {
                        view.view_proj = point_face_view_projection(
                            l.position,
                            face,
                            settings.near,
                            settings.far,
                        );
                    }
                }
            }
            Light::Directional(l) => {
                if let Some(settings) = &l.shadow {
                    let cascades = settings.cascades.iter().take(MAX_CASCADES);
                    for (i, (view, &half_extent)) in
                        self.views.iter_mut().zip(cascades).enumerate()
                    {
                        self.extents[i] = half_extent;
                        view.view_proj = cascade_view_projection(
                            camera_position,
                            l.direction,
                            settings.distance,
                            half_extent,
                        );
                    }
                }
            }
            Light::Ambient(_) => {}
        }
    }

    /// Number of views in this set
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// World-space size of one texel in the first view's footprint
    ///
    /// Meaningful for cascade sets (used to scale sampling offsets);
    /// zero for spot and point sets.
    pub fn texel_size(&self) -> f32 {
        if self.projection == ShadowProjection::Cascade && self.resolution > 0 {
            2.0 * self.extents[0] / self.resolution as f32
        } else {
            0.0
        }
    }
}
