//! Frame Compositor
//!
//! Turns a light list and its shadow sets into an ordered pass schedule
//! plus the packed uniform arrays the backend uploads. Scheduling is
//! pure bookkeeping; no GPU resources are touched here.
//!
//! # Pass Ordering
//!
//! Every shadow view renders before any color pass. Color passes run
//! one per enabled light: the first writes opaquely with a cleared
//! target and `Less` depth testing; the rest accumulate additively over
//! the preserved depth buffer with `LessEqual`, so equal-depth
//! fragments from later lights still contribute. Disabled lights are
//! skipped entirely and shift the ordering up.

use alloc::vec::Vec;

use crate::light::Light;
use crate::shadow::config::ShadowConfig;
use crate::shadow::data::{GpuLight, GpuShadow};
use crate::shadow::set::ShadowSet;

/// Blend behavior of a color pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassBlend {
    /// Replace the target (first light)
    Opaque,
    /// Accumulate onto the target (subsequent lights)
    Additive,
}

/// Depth test of a color pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthCompare {
    /// Strict test for the depth-writing first pass
    Less,
    /// Permissive test so later lights re-shade the same surfaces
    LessEqual,
}

/// Camera state for one frame
#[derive(Clone, Copy, Debug)]
pub struct ViewFrame {
    /// Camera world position (anchors directional shadow views)
    pub camera_position: [f32; 3],
    /// Camera view-projection matrix (column-major)
    pub view_proj: [[f32; 4]; 4],
}

/// One depth-only shadow rasterization
#[derive(Clone, Copy, Debug)]
pub struct ShadowPassDesc {
    /// Index of the owning light in the schedule's light array
    pub light_index: usize,
    /// View index within the light's shadow set
    pub view_index: usize,
    /// Depth array layer to render into
    pub layer: u32,
    /// Viewport size (square)
    pub resolution: u32,
    /// Constant depth bias, fixed at pipeline creation
    pub bias: f32,
    /// Slope-scaled depth bias, fixed at pipeline creation
    pub slope_bias: f32,
    /// View-projection matrix for this view
    pub view_proj: [[f32; 4]; 4],
}

/// One per-light color pass
#[derive(Clone, Copy, Debug)]
pub struct ColorPassDesc {
    /// Index of the light in the schedule's light array
    pub light_index: usize,
    /// Blend behavior
    pub blend: PassBlend,
    /// Depth test
    pub depth_compare: DepthCompare,
    /// Clear color and depth before this pass
    pub clear: bool,
}

/// Scheduling statistics
#[derive(Clone, Copy, Debug, Default)]
pub struct ScheduleStats {
    /// Lights considered
    pub lights_total: u32,
    /// Lights that produced a color pass
    pub lights_active: u32,
    /// Shadow views scheduled
    pub shadow_views: u32,
    /// Lights skipped as disabled
    pub lights_skipped: u32,
}

/// An ordered frame: shadow passes, then color passes
#[derive(Clone, Debug)]
pub struct FrameSchedule {
    /// Camera state for the color passes
    pub frame: ViewFrame,
    /// Depth-only passes, all lights' views in order
    pub shadow_passes: Vec<ShadowPassDesc>,
    /// Per-light color passes
    pub color_passes: Vec<ColorPassDesc>,
    /// Packed light records, one per scheduled color pass
    pub lights: Vec<GpuLight>,
    /// Packed shadow records, referenced by `GpuLight::shadow_index`
    pub shadows: Vec<GpuShadow>,
    /// Statistics
    pub stats: ScheduleStats,
}

impl FrameSchedule {
    /// Whether any color pass runs this frame
    ///
    /// An empty schedule means the backend should still clear the target.
    pub fn is_empty(&self) -> bool {
        self.color_passes.is_empty()
    }
}

/// Per-frame pass scheduler
#[derive(Clone, Debug, Default)]
pub struct FrameScheduler {
    config: ShadowConfig,
}

impl FrameScheduler {
    /// Create a scheduler with a shadow configuration
    pub fn new(config: ShadowConfig) -> Self {
        Self { config }
    }

    /// Access the shadow configuration
    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Replace the shadow configuration
    pub fn set_config(&mut self, config: ShadowConfig) {
        self.config = config;
    }

    /// Build the pass schedule for one frame
    ///
    /// `sets` parallels `lights`: `sets[i]` is light `i`'s shadow set,
    /// already rebuilt for this frame, or None for shadowless lights.
    /// A set whose light is disabled contributes nothing.
    pub fn schedule(
        &self,
        frame: ViewFrame,
        lights: &[Light],
        sets: &[Option<ShadowSet>],
    ) -> FrameSchedule {
        let mut schedule = FrameSchedule {
            frame,
            shadow_passes: Vec::new(),
            color_passes: Vec::new(),
            lights: Vec::new(),
            shadows: Vec::new(),
            stats: ScheduleStats {
                lights_total: lights.len() as u32,
                ..Default::default()
            },
        };

        for (i, light) in lights.iter().enumerate() {
            if !light.enabled() {
                schedule.stats.lights_skipped += 1;
                continue;
            }

            let light_index = schedule.lights.len();
            let set = if self.config.enabled {
                sets.get(i).and_then(|s| s.as_ref())
            } else {
                None
            };

            let shadow_index = match set {
                Some(set) => {
                    for (view_index, view) in set.views.iter().enumerate() {
                        schedule.shadow_passes.push(ShadowPassDesc {
                            light_index,
                            view_index,
                            layer: view.layer,
                            resolution: set.resolution,
                            bias: set.bias,
                            slope_bias: set.slope_bias,
                            view_proj: view.view_proj,
                        });
                    }
                    schedule.stats.shadow_views += set.views.len() as u32;
                    schedule.shadows.push(GpuShadow::from_set(set));
                    (schedule.shadows.len() - 1) as i32
                }
                None => -1,
            };

            let first = schedule.color_passes.is_empty();
            schedule.color_passes.push(ColorPassDesc {
                light_index,
                blend: if first { PassBlend::Opaque } else { PassBlend::Additive },
                depth_compare: if first { DepthCompare::Less } else { DepthCompare::LessEqual },
                clear: first,
            });
            schedule.lights.push(GpuLight::from_light(light, shadow_index));
            schedule.stats.lights_active += 1;
        }

        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::{
        AmbientLight, CascadeShadowSettings, DirectionalLight, PointLight,
        ProjectedShadowSettings, SpotLight,
    };
    use crate::shadow::pool::ShadowMapPool;
    use crate::shadow::transform::IDENTITY_MATRIX;

    fn frame() -> ViewFrame {
        ViewFrame {
            camera_position: [0.0; 3],
            view_proj: IDENTITY_MATRIX,
        }
    }

    fn scene() -> (Vec<Light>, Vec<Option<ShadowSet>>) {
        let mut pool = ShadowMapPool::new(2048, 16);
        let lights = alloc::vec![
            Light::Ambient(AmbientLight::default()),
            Light::Directional(DirectionalLight::new([0.0, -1.0, 0.0]).with_shadow(
                CascadeShadowSettings::default().with_cascades(&[10.0, 50.0]),
            )),
            Light::Spot(
                SpotLight::new([0.0, 5.0, 0.0], [0.0, -1.0, 0.0])
                    .with_shadow(ProjectedShadowSettings::default()),
            ),
        ];

        let sets = lights
            .iter()
            .enumerate()
            .map(|(i, light)| {
                let views = light.shadow_view_count() as u32;
                if views == 0 {
                    return None;
                }
                let alloc = pool.allocate(i as u64, views, 2048)?;
                ShadowSet::build(light, &alloc, [0.0; 3])
            })
            .collect();

        (lights, sets)
    }

    #[test]
    fn test_schedule_ordering() {
        let (lights, sets) = scene();
        let scheduler = FrameScheduler::default();
        let schedule = scheduler.schedule(frame(), &lights, &sets);

        // 2 cascades + 1 spot view, then 3 color passes.
        assert_eq!(schedule.shadow_passes.len(), 3);
        assert_eq!(schedule.color_passes.len(), 3);

        // First color pass clears and writes opaquely; the rest add.
        assert_eq!(schedule.color_passes[0].blend, PassBlend::Opaque);
        assert!(schedule.color_passes[0].clear);
        assert_eq!(schedule.color_passes[0].depth_compare, DepthCompare::Less);
        for pass in &schedule.color_passes[1..] {
            assert_eq!(pass.blend, PassBlend::Additive);
            assert!(!pass.clear);
            assert_eq!(pass.depth_compare, DepthCompare::LessEqual);
        }
    }

    #[test]
    fn test_schedule_shadow_indices() {
        let (lights, sets) = scene();
        let schedule = FrameScheduler::default().schedule(frame(), &lights, &sets);

        // Ambient has no shadow record; the casters index in order.
        assert_eq!(schedule.lights[0].shadow_index, -1);
        assert_eq!(schedule.lights[1].shadow_index, 0);
        assert_eq!(schedule.lights[2].shadow_index, 1);
        assert_eq!(schedule.shadows.len(), 2);
        assert_eq!(schedule.shadows[0].view_count, 2);
        assert_eq!(schedule.shadows[1].view_count, 1);
    }

    #[test]
    fn test_disabled_light_skipped() {
        let (mut lights, sets) = scene();
        lights[1].set_enabled(false);

        let schedule = FrameScheduler::default().schedule(frame(), &lights, &sets);

        // The directional light's cascades and color pass disappear and
        // the spot light becomes the second pass.
        assert_eq!(schedule.shadow_passes.len(), 1);
        assert_eq!(schedule.color_passes.len(), 2);
        assert_eq!(schedule.stats.lights_skipped, 1);
        assert_eq!(schedule.lights[1].kind, 3);
        assert_eq!(schedule.lights[1].shadow_index, 0);
    }

    #[test]
    fn test_all_disabled_empty_schedule() {
        let (mut lights, sets) = scene();
        for light in &mut lights {
            light.set_enabled(false);
        }

        let schedule = FrameScheduler::default().schedule(frame(), &lights, &sets);
        assert!(schedule.is_empty());
        assert_eq!(schedule.stats.lights_active, 0);
    }

    #[test]
    fn test_shadows_globally_disabled() {
        let (lights, sets) = scene();
        let scheduler = FrameScheduler::new(ShadowConfig::disabled());
        let schedule = scheduler.schedule(frame(), &lights, &sets);

        // Color passes still run; no shadow work is scheduled.
        assert_eq!(schedule.shadow_passes.len(), 0);
        assert_eq!(schedule.color_passes.len(), 3);
        for light in &schedule.lights {
            assert_eq!(light.shadow_index, -1);
        }
    }

    #[test]
    fn test_shadowless_light_in_schedule() {
        let lights = alloc::vec![Light::Point(PointLight::new([0.0; 3]))];
        let sets = alloc::vec![None];

        let schedule = FrameScheduler::default().schedule(frame(), &lights, &sets);
        assert_eq!(schedule.shadow_passes.len(), 0);
        assert_eq!(schedule.color_passes.len(), 1);
        assert_eq!(schedule.lights[0].shadow_index, -1);
    }

    #[test]
    fn test_shadow_pass_bias_parameters() {
        let (lights, sets) = scene();
        let schedule = FrameScheduler::default().schedule(frame(), &lights, &sets);

        // Cascade passes carry the directional settings' bias pair.
        let pass = &schedule.shadow_passes[0];
        assert_eq!(pass.bias, 2.0);
        assert_eq!(pass.slope_bias, 2.0);
        assert_eq!(pass.resolution, 2048);

        // The spot pass carries its own.
        let pass = &schedule.shadow_passes[2];
        assert_eq!(pass.slope_bias, 2.5);
    }
}
