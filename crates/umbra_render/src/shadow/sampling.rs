//! Shadow Sampling Reference
//!
//! CPU implementation of the visibility contract the shading pass
//! evaluates on the GPU. The backend's WGSL mirrors this module; tests
//! here pin down the semantics the shader must reproduce:
//!
//! - Points outside every shadow footprint are fully lit
//! - Cascade selection compares camera distance against the cascade
//!   half-extents, first-fit near-to-far, falling back to the last
//!   cascade
//! - Point lights resolve overlapping cube faces last-in-order-wins
//! - The depth comparison is `LessEqual` with bilinear filtering of the
//!   comparison results, matching a hardware comparison sampler

use super::set::{ShadowProjection, ShadowSet};

use alloc::vec;
use alloc::vec::Vec;

/// A world point projected into one shadow view
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedSample {
    /// Horizontal map coordinate (0-1 inside the footprint)
    pub u: f32,
    /// Vertical map coordinate (0-1 inside the footprint)
    pub v: f32,
    /// Light-space depth (0-1 inside the depth range)
    pub depth: f32,
}

impl ProjectedSample {
    /// Whether the sample falls inside the shadow map footprint
    pub fn in_range(&self) -> bool {
        self.u >= 0.0
            && self.u <= 1.0
            && self.v >= 0.0
            && self.v <= 1.0
            && self.depth >= 0.0
            && self.depth <= 1.0
    }
}

/// Project a world point through a shadow view-projection matrix
///
/// Returns None for points at or behind the projection plane (w <= 0).
/// x/y are remapped from [-1, 1] clip space to [0, 1] map coordinates
/// with v flipped for texture addressing; depth is already [0, 1].
pub fn project(view_proj: &[[f32; 4]; 4], world: [f32; 3]) -> Option<ProjectedSample> {
    let clip = super::transform::transform_vec4(view_proj, [world[0], world[1], world[2], 1.0]);
    if clip[3] <= 0.0 {
        return None;
    }

    let inv_w = 1.0 / clip[3];
    Some(ProjectedSample {
        u: clip[0] * inv_w * 0.5 + 0.5,
        v: 0.5 - clip[1] * inv_w * 0.5,
        depth: clip[2] * inv_w,
    })
}

/// Select the cascade covering a world point
///
/// Picks the first cascade, near to far, whose half-extent covers the
/// distance from the reference camera to the point. A point further
/// than every extent falls back to the last cascade, whose projection
/// then reports it out of range.
pub fn select_cascade(set: &ShadowSet, camera_position: [f32; 3], world: [f32; 3]) -> usize {
    let dx = world[0] - camera_position[0];
    let dy = world[1] - camera_position[1];
    let dz = world[2] - camera_position[2];
    let dist_sq = dx * dx + dy * dy + dz * dz;

    let last = set.views.len().saturating_sub(1);
    for i in 0..set.views.len() {
        let extent = set.extents[i];
        if dist_sq <= extent * extent {
            return i;
        }
    }
    last
}

/// Source of stored shadow depth values
///
/// Abstracts over depth storage so the visibility functions can be
/// exercised against synthetic depth data in tests.
pub trait DepthSource {
    /// Square resolution of each layer
    fn resolution(&self) -> u32;

    /// Fetch the stored depth at a texel (coordinates already in range)
    fn fetch(&self, layer: u32, x: u32, y: u32) -> f32;
}

/// Bilinearly filtered depth comparison at a map coordinate
///
/// Compares `depth` against the four nearest texels with `LessEqual`
/// and blends the binary results, the way a linear comparison sampler
/// does. Returns the lit fraction in [0, 1].
pub fn compare_depth<S: DepthSource + ?Sized>(
    source: &S,
    layer: u32,
    u: f32,
    v: f32,
    depth: f32,
) -> f32 {
    let res = source.resolution();
    if res == 0 {
        return 1.0;
    }
    let max_texel = res - 1;

    let x = u * res as f32 - 0.5;
    let y = v * res as f32 - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let texel = |t: f32| -> u32 {
        if t < 0.0 {
            0
        } else {
            (t as u32).min(max_texel)
        }
    };

    let mut lit = 0.0;
    let weights = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1.0, y0, fx * (1.0 - fy)),
        (x0, y0 + 1.0, (1.0 - fx) * fy),
        (x0 + 1.0, y0 + 1.0, fx * fy),
    ];
    for (tx, ty, w) in weights {
        let stored = source.fetch(layer, texel(tx), texel(ty));
        if depth <= stored {
            lit += w;
        }
    }
    lit
}

/// Evaluate shadowed visibility of a world point under one light
///
/// Returns the lit fraction in [0, 1]. A light without a shadow set is
/// fully visible, as is any point outside the light's shadow coverage.
pub fn light_visibility<S: DepthSource + ?Sized>(
    set: Option<&ShadowSet>,
    source: &S,
    camera_position: [f32; 3],
    world: [f32; 3],
) -> f32 {
    let set = match set {
        Some(set) if !set.views.is_empty() => set,
        _ => return 1.0,
    };

    match set.projection {
        ShadowProjection::Spot => {
            let view = &set.views[0];
            match project(&view.view_proj, world) {
                Some(s) if s.in_range() => compare_depth(source, view.layer, s.u, s.v, s.depth),
                _ => 1.0,
            }
        }
        ShadowProjection::Point => {
            // Overlapping faces resolve last-in-order-wins.
            let mut visibility = 1.0;
            for view in &set.views {
                if let Some(s) = project(&view.view_proj, world) {
                    if s.in_range() {
                        visibility = compare_depth(source, view.layer, s.u, s.v, s.depth);
                    }
                }
            }
            visibility
        }
        ShadowProjection::Cascade => {
            let view = &set.views[select_cascade(set, camera_position, world)];
            match project(&view.view_proj, world) {
                Some(s) if s.in_range() => compare_depth(source, view.layer, s.u, s.v, s.depth),
                _ => 1.0,
            }
        }
    }
}

/// In-memory depth layers for tests and software rasterization
#[derive(Clone, Debug)]
pub struct DepthImage {
    resolution: u32,
    layers: Vec<Vec<f32>>,
}

impl DepthImage {
    /// Create depth layers cleared to the far plane (1.0)
    pub fn new(resolution: u32, layer_count: u32) -> Self {
        Self {
            resolution,
            layers: vec![vec![1.0; (resolution * resolution) as usize]; layer_count as usize],
        }
    }

    /// Write a depth value at a texel
    pub fn set(&mut self, layer: u32, x: u32, y: u32, depth: f32) {
        self.layers[layer as usize][(y * self.resolution + x) as usize] = depth;
    }

    /// Fill an entire layer with a depth value
    pub fn fill_layer(&mut self, layer: u32, depth: f32) {
        for texel in &mut self.layers[layer as usize] {
            *texel = depth;
        }
    }

    /// Number of layers
    pub fn layer_count(&self) -> u32 {
        self.layers.len() as u32
    }
}

impl DepthSource for DepthImage {
    fn resolution(&self) -> u32 {
        self.resolution
    }

    fn fetch(&self, layer: u32, x: u32, y: u32) -> f32 {
        self.layers[layer as usize][(y * self.resolution + x) as usize]
    }
}
