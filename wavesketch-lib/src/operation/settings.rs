use log::warn;
use serde::{Deserialize, Serialize};

pub const DEFAULT_POINTS_PER_SECOND: f64 = 10.0;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10;

/// Target density and progress coalescing for a [`super::SampleOperation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationSettings {
    /// Output points per second of audio.
    pub points_per_second: f64,
    /// Loop iterations between progress snapshots.
    pub progress_interval: usize,
}

impl Default for OperationSettings {
    fn default() -> Self {
        Self {
            points_per_second: DEFAULT_POINTS_PER_SECOND,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl OperationSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        if !valid_density(settings.points_per_second) {
            warn!(
                "ignoring points_per_second {} from settings",
                settings.points_per_second
            );
            settings.points_per_second = DEFAULT_POINTS_PER_SECOND;
        }
        settings.progress_interval = settings.progress_interval.max(1);
        Ok(settings)
    }

    /// Configure output density. Non-finite or non-positive values are ignored.
    pub fn set_points_per_second(&mut self, points_per_second: f64) {
        if valid_density(points_per_second) {
            self.points_per_second = points_per_second;
        } else {
            warn!("ignoring points_per_second {}", points_per_second);
        }
    }

    /// Configure iterations between progress snapshots. Zero is treated as one.
    pub fn set_progress_interval(&mut self, iterations: usize) {
        self.progress_interval = iterations.max(1);
    }
}

fn valid_density(points_per_second: f64) -> bool {
    points_per_second.is_finite() && points_per_second > 0.0
}
