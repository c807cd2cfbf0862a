//! Layout distances used by snapping and bumping.
//!
//! Both values are in workspace units, the same unit connection positions
//! use. A config can be deserialized from any serde format; missing fields
//! take their defaults.
//!
//! ```
//! use block_snap::LayoutConfig;
//!
//! let config: LayoutConfig = serde_json::from_str(r#"{ "snap_distance": 40.0 }"#).unwrap();
//! assert_eq!(config.snap_distance, 40.0);
//! assert_eq!(config.bump_distance, LayoutConfig::DEFAULT_BUMP_DISTANCE);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Maximum distance at which a dragged connection snaps to a candidate.
    #[serde(default = "default_snap_distance")]
    pub snap_distance: f64,
    /// Offset, on both axes, between bumped connections.
    #[serde(default = "default_bump_distance")]
    pub bump_distance: f64,
}

fn default_snap_distance() -> f64 {
    LayoutConfig::DEFAULT_SNAP_DISTANCE
}

fn default_bump_distance() -> f64 {
    LayoutConfig::DEFAULT_BUMP_DISTANCE
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            snap_distance: Self::DEFAULT_SNAP_DISTANCE,
            bump_distance: Self::DEFAULT_BUMP_DISTANCE,
        }
    }
}

impl LayoutConfig {
    pub const DEFAULT_SNAP_DISTANCE: f64 = 25.0;
    pub const DEFAULT_BUMP_DISTANCE: f64 = 25.0;

    pub fn with_snap_distance(mut self, distance: f64) -> Self {
        self.snap_distance = distance;
        self
    }

    pub fn with_bump_distance(mut self, distance: f64) -> Self {
        self.bump_distance = distance;
        self
    }

    /// Reject negative, infinite and NaN distances.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("snap_distance", self.snap_distance),
            ("bump_distance", self.bump_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDistance { name, value });
            }
        }
        Ok(())
    }
}
