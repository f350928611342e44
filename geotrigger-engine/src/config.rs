//! Engine configuration

use chrono::Duration;

use geotrigger_api::model::Proximity;

/// Tunable thresholds for the monitoring engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Distances below this bucket as `Immediate`
    pub near_distance_m: f64,
    /// Distances below this (and at or above `near_distance_m`) bucket
    /// as `Near`; everything else is `Far`
    pub far_distance_m: f64,
    /// Minimum displacement from the last synchronized fix before the
    /// monitoring synchronizer runs again
    pub displacement_threshold_m: f64,
    /// De-dup window for beacon observations within a session
    pub observation_window: Duration,
}

impl EngineConfig {
    /// Bucket a scalar ranging distance into a proximity class
    pub fn bucket(&self, distance_m: f64) -> Proximity {
        if distance_m < self.near_distance_m {
            Proximity::Immediate
        } else if distance_m < self.far_distance_m {
            Proximity::Near
        } else {
            Proximity::Far
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            near_distance_m: 1.0,
            far_distance_m: 10.0,
            displacement_threshold_m: 100.0,
            observation_window: Duration::minutes(15),
        }
    }
}
