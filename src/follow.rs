//! Decide when the map should be recentered on the user while follow mode is on
use crate::filter::{should_keep_as_trace, FilterConfig};
use crate::gps::LocationSample;
use crate::services::MapView;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How far the user must be from the map center before the map follows.
///
/// `Percent` is relative to the shorter side of the visible map area so the threshold
/// scales with zoom; `Meters` is an absolute distance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinDistance {
    Meters(f64),
    Percent(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// [ms] how long is a long press (click/tap)
    pub longpress: u64,
    /// [s] minimum time between recenter attempts
    pub min_interval: f64,
    pub min_distance: MinDistance,
    /// no recentering below this zoom level
    pub min_zoom: u32,
    /// [ms] how long the button shows click feedback
    pub clicked_timeout: u64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        FollowConfig {
            longpress: 1500,
            min_interval: 5.0,
            min_distance: MinDistance::Percent(10.0),
            min_zoom: 13,
            clicked_timeout: 3000,
        }
    }
}

impl FollowConfig {
    pub fn min_interval_ms(&self) -> i64 {
        (self.min_interval * 1000.0) as i64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowState {
    Idle,
    Following,
}

/// Outcome of offering a fix to the controller
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FollowDecision {
    Idle,
    /// the fix isn't trace-worthy
    Filtered,
    ZoomedOut,
    TooSoon,
    /// distance from the center in the configured unit
    TooClose(f64),
    /// the visible map has no size, a percent distance can't be measured
    NoFootprint,
    Recentered(f64),
}

#[derive(Debug)]
pub struct FollowController {
    config: FollowConfig,
    state: FollowState,
    last_attempt_ms: Option<i64>,
    last_centered_ms: Option<i64>,
    /// shorter side of the visible map in meters, per zoom level
    footprints: HashMap<u32, f64>,
}

impl FollowController {
    pub fn new(config: FollowConfig) -> Self {
        FollowController {
            config,
            state: FollowState::Idle,
            last_attempt_ms: None,
            last_centered_ms: None,
            footprints: HashMap::new(),
        }
    }

    pub fn config(&self) -> &FollowConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FollowConfig) {
        self.config = config;
    }

    pub fn state(&self) -> FollowState {
        self.state
    }

    pub fn is_following(&self) -> bool {
        self.state == FollowState::Following
    }

    pub fn last_centered_ms(&self) -> Option<i64> {
        self.last_centered_ms
    }

    pub fn start(&mut self) {
        if self.state == FollowState::Idle {
            debug!("follow mode started");
        }
        self.state = FollowState::Following;
        self.last_attempt_ms = None;
    }

    pub fn stop(&mut self) {
        if self.state == FollowState::Following {
            debug!("follow mode ended");
        }
        self.state = FollowState::Idle;
    }

    /// Record a recenter that happened outside of the controller (e.g. a manual one) so
    /// it counts towards the rate limit.
    pub fn note_recentered(&mut self, timestamp_ms: i64) {
        self.last_attempt_ms = Some(timestamp_ms);
        self.last_centered_ms = Some(timestamp_ms);
    }

    /// Drop cached map footprints, needed when the map viewport changes size
    pub fn invalidate_footprints(&mut self) {
        self.footprints.clear();
    }

    /// Offer a fix and recenter the map if it moved far enough from the center.
    ///
    /// The attempt timestamp is refreshed whenever the interval gate passes, even if the
    /// distance turns out too small. A fix older than the last attempt re-arms the gate.
    pub fn on_sample(
        &mut self,
        sample: &LocationSample,
        filter: &FilterConfig,
        map: &mut dyn MapView,
    ) -> FollowDecision {
        if self.state == FollowState::Idle {
            return FollowDecision::Idle;
        }
        if !should_keep_as_trace(sample, filter) {
            return FollowDecision::Filtered;
        }
        let zoom = map.zoom();
        if zoom < self.config.min_zoom {
            return FollowDecision::ZoomedOut;
        }
        let now = sample.timestamp();
        if let Some(last) = self.last_attempt_ms {
            let elapsed = now.saturating_sub(last);
            if elapsed >= 0 && elapsed < self.config.min_interval_ms() {
                return FollowDecision::TooSoon;
            }
        }
        self.last_attempt_ms = Some(now);

        let meters = sample.position().distance_to(&map.center());
        let (distance, threshold) = match self.config.min_distance {
            MinDistance::Meters(threshold) => (meters, threshold),
            MinDistance::Percent(threshold) => {
                let footprint = self.footprint(zoom, map);
                if !(footprint > 0.0 && footprint.is_finite()) {
                    debug!("map footprint at zoom {} is {}, not following", zoom, footprint);
                    return FollowDecision::NoFootprint;
                }
                (meters / footprint * 100.0, threshold)
            }
        };
        if distance > threshold {
            trace!("recentering map, distance from center: {:.1}", distance);
            map.set_view(sample.position(), zoom);
            self.last_centered_ms = Some(now);
            FollowDecision::Recentered(distance)
        } else {
            FollowDecision::TooClose(distance)
        }
    }

    fn footprint(&mut self, zoom: u32, map: &dyn MapView) -> f64 {
        if let Some(size) = self.footprints.get(&zoom) {
            return *size;
        }
        let size = map.bounds().shorter_side_meters();
        if size > 0.0 && size.is_finite() {
            self.footprints.insert(zoom, size);
        }
        size
    }
}
