//! Shadow Configuration
//!
//! Global shadow settings with serde support for hot-reload.

use serde::{Deserialize, Serialize};

use super::transform::MAX_CASCADES;

/// Global shadow configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Enable shadows globally
    pub enabled: bool,

    /// Default shadow map resolution (power of 2)
    pub default_resolution: u32,

    /// Maximum depth layers in the shadow array
    pub max_layers: u32,

    /// Default cascade count for directional lights (1-4)
    pub cascade_count: u32,

    /// Maximum shadow distance from the reference camera
    pub shadow_distance: f32,

    /// Default constant depth bias (hardware units)
    pub depth_bias: f32,

    /// Default slope-scaled depth bias
    pub slope_bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_resolution: 2048,
            max_layers: 16,
            cascade_count: 4,
            shadow_distance: 500.0,
            depth_bias: 2.0,
            slope_bias: 2.0,
        }
    }
}

impl ShadowConfig {
    /// Create a high-quality shadow configuration
    pub fn high_quality() -> Self {
        Self {
            default_resolution: 4096,
            max_layers: 32,
            ..Default::default()
        }
    }

    /// Create a low-quality shadow configuration for performance
    pub fn low_quality() -> Self {
        Self {
            default_resolution: 1024,
            max_layers: 8,
            cascade_count: 2,
            shadow_distance: 200.0,
            ..Default::default()
        }
    }

    /// Create a configuration with shadows disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Validate configuration and clamp values to valid ranges
    pub fn validate(&mut self) {
        self.default_resolution = self.default_resolution.clamp(256, 8192);
        self.default_resolution = self.default_resolution.next_power_of_two();
        // A single point light needs six layers.
        self.max_layers = self.max_layers.clamp(6, 64);
        self.cascade_count = self.cascade_count.clamp(1, MAX_CASCADES as u32);
        self.shadow_distance = self.shadow_distance.max(1.0);
        self.slope_bias = self.slope_bias.max(0.0);
    }
}

/// Shadow quality preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowQuality {
    /// No shadows
    Off,
    /// Basic shadows with low resolution
    Low,
    /// Balanced quality and performance
    Medium,
    /// High quality shadows
    High,
}

impl ShadowQuality {
    /// Convert to a ShadowConfig
    pub fn to_config(self) -> ShadowConfig {
        match self {
            Self::Off => ShadowConfig::disabled(),
            Self::Low => ShadowConfig::low_quality(),
            Self::Medium => ShadowConfig::default(),
            Self::High => ShadowConfig::high_quality(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_config_default() {
        let config = ShadowConfig::default();
        assert!(config.enabled);
        assert_eq!(config.default_resolution, 2048);
        assert_eq!(config.cascade_count, 4);
    }

    #[test]
    fn test_shadow_config_validate() {
        let mut config = ShadowConfig {
            default_resolution: 1000, // Not power of 2
            max_layers: 100,          // Too high
            cascade_count: 10,        // Too high
            shadow_distance: 0.0,     // Too low
            ..Default::default()
        };

        config.validate();

        assert_eq!(config.default_resolution, 1024); // Next power of 2
        assert_eq!(config.max_layers, 64);
        assert_eq!(config.cascade_count, 4);
        assert_eq!(config.shadow_distance, 1.0);
    }

    #[test]
    fn test_shadow_config_serialization() {
        let config = ShadowConfig::high_quality();
        let json = serde_json::to_string(&config).unwrap();
        let restored: ShadowConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.default_resolution, 4096);
        assert_eq!(restored.max_layers, 32);
    }

    #[test]
    fn test_shadow_quality_presets() {
        let off = ShadowQuality::Off.to_config();
        assert!(!off.enabled);

        let low = ShadowQuality::Low.to_config();
        assert_eq!(low.cascade_count, 2);

        let high = ShadowQuality::High.to_config();
        assert_eq!(high.default_resolution, 4096);
    }
}
