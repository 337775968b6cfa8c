//! Decide which fixes are worth keeping as trace points
use crate::gps::LocationSample;
use serde::{Deserialize, Serialize};

/// Thresholds used to sort trace-worthy fixes from noise
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// [m] largest accuracy radius that is still accepted, coarser fixes are dropped
    pub accuracy_minimum: f64,
    /// [m/s] slower fixes are treated as standing still (1 km/h ~= 0.2778 m/s)
    pub speed_minimum: f64,
    /// [minutes] trace points older than this are removed
    pub age_maximum: u32,
    /// max number of trace points
    pub length_maximum: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            accuracy_minimum: 30.0,
            speed_minimum: 0.2,
            age_maximum: 60,
            length_maximum: 200,
        }
    }
}

impl FilterConfig {
    pub fn age_maximum_ms(&self) -> i64 {
        i64::from(self.age_maximum) * 60_000
    }
}

/// Should the fix be left as a trace point.
///
/// A fix with unknown speed is never kept.
pub fn should_keep_as_trace(sample: &LocationSample, config: &FilterConfig) -> bool {
    if !(sample.accuracy() <= config.accuracy_minimum) {
        return false;
    }
    match sample.speed() {
        Some(speed) => speed >= config.speed_minimum,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(accuracy: f64, speed: Option<f64>) -> LocationSample {
        LocationSample::new(50.0, 19.9, accuracy, speed, 0)
    }

    #[test]
    fn test_accepts_accurate_moving_fix() {
        let config = FilterConfig::default();
        assert!(should_keep_as_trace(&sample(10.0, Some(1.0)), &config));
        // both limits are inclusive
        assert!(should_keep_as_trace(&sample(30.0, Some(0.2)), &config));
    }

    #[test]
    fn test_rejects_coarse_fix() {
        let config = FilterConfig::default();
        assert!(!should_keep_as_trace(&sample(30.5, Some(5.0)), &config));
        assert!(!should_keep_as_trace(&sample(f64::NAN, Some(5.0)), &config));
    }

    #[test]
    fn test_rejects_standing_still() {
        let config = FilterConfig::default();
        assert!(!should_keep_as_trace(&sample(5.0, Some(0.0)), &config));
        assert!(!should_keep_as_trace(&sample(5.0, Some(0.19)), &config));
    }

    #[test]
    fn test_rejects_unknown_speed() {
        let config = FilterConfig::default();
        assert!(!should_keep_as_trace(&sample(1.0, None), &config));
        assert!(!should_keep_as_trace(&sample(1000.0, None), &config));

        let lenient = FilterConfig {
            speed_minimum: 0.0,
            ..FilterConfig::default()
        };
        assert!(!should_keep_as_trace(&sample(1.0, None), &lenient));
    }

    #[test]
    fn test_property_matches_definition() {
        let config = FilterConfig::default();
        let accuracies = [0.0, 5.0, 29.9, 30.0, 30.1, 200.0];
        let speeds = [None, Some(0.0), Some(0.1), Some(0.2), Some(0.3), Some(30.0)];
        for &accuracy in accuracies.iter() {
            for &speed in speeds.iter() {
                let expected = accuracy <= config.accuracy_minimum
                    && speed.map_or(false, |s| s >= config.speed_minimum);
                assert_eq!(
                    should_keep_as_trace(&sample(accuracy, speed), &config),
                    expected,
                    "accuracy={} speed={:?}",
                    accuracy,
                    speed
                );
            }
        }
    }
}
