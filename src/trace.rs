//! Bounded history of trace-worthy fixes and the markers drawn for them
use crate::filter::{should_keep_as_trace, FilterConfig};
use crate::gps::LocationSample;
use crate::services::{DrawLayer, MarkerHandle, MarkerStyle};
use log::trace;
use std::collections::VecDeque;

/// A fix that has been drawn as a trace marker
#[derive(Clone, Copy, Debug)]
pub struct TracePoint {
    sample: LocationSample,
    marker: MarkerHandle,
}

impl TracePoint {
    pub fn sample(&self) -> &LocationSample {
        &self.sample
    }

    pub fn marker(&self) -> MarkerHandle {
        self.marker
    }
}

/// Accepted fixes in arrival order.
///
/// The newest accepted fix is only staged: it is shown by the current position marker and
/// gets its own trace marker once any later fix arrives. The staged fix counts towards
/// the length limit.
#[derive(Debug, Default)]
pub struct TraceStore {
    points: VecDeque<TracePoint>,
    staged: Option<LocationSample>,
}

impl TraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted fixes held, drawn or staged
    pub fn len(&self) -> usize {
        self.points.len() + if self.staged.is_some() { 1 } else { 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> impl Iterator<Item = &TracePoint> + '_ {
        self.points.iter()
    }

    pub fn staged(&self) -> Option<&LocationSample> {
        self.staged.as_ref()
    }

    /// All held fixes, oldest first
    pub fn samples(&self) -> impl Iterator<Item = &LocationSample> + '_ {
        self.points.iter().map(|p| &p.sample).chain(self.staged.iter())
    }

    /// Handle a new location event.
    ///
    /// Draws the previously staged fix, stages this one if it passes the filter and then
    /// trims the store. Returns true if the fix was accepted.
    pub fn append_if_accepted(
        &mut self,
        sample: &LocationSample,
        config: &FilterConfig,
        layer: &mut DrawLayer<'_>,
    ) -> bool {
        if let Some(previous) = self.staged.take() {
            let marker = layer.draw(previous.position(), &MarkerStyle::trace());
            self.points.push_back(TracePoint {
                sample: previous,
                marker,
            });
        }

        let accepted = should_keep_as_trace(sample, config);
        if accepted {
            self.staged = Some(*sample);
        }
        self.enforce_capacity(sample.timestamp(), config, layer);
        accepted
    }

    /// Remove the oldest points while the store is over its length limit or while they are
    /// older than the age limit relative to `now_ms`. Returns the number of removed points.
    pub fn enforce_capacity(
        &mut self,
        now_ms: i64,
        config: &FilterConfig,
        layer: &mut DrawLayer<'_>,
    ) -> usize {
        let max_age = config.age_maximum_ms();
        let mut evicted = 0;
        while let Some(oldest) = self.points.front() {
            let too_many = self.len() > config.length_maximum;
            let too_old = now_ms.saturating_sub(oldest.sample.timestamp()) > max_age;
            if !(too_many || too_old) {
                break;
            }
            if let Some(point) = self.points.pop_front() {
                layer.erase(point.marker);
                evicted += 1;
            }
        }
        // only reachable with a zero length limit
        if self.len() > config.length_maximum && self.staged.take().is_some() {
            evicted += 1;
        }
        if evicted > 0 {
            trace!("removed {} trace point(s), {} left", evicted, self.len());
        }
        evicted
    }

    /// Remove every point and its marker
    pub fn clear(&mut self, layer: &mut DrawLayer<'_>) {
        for point in self.points.drain(..) {
            layer.erase(point.marker);
        }
        self.staged = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::simulated::SimulatedMap;
    use crate::services::{LayerHandle, MapView};

    fn moving(i: i64) -> LocationSample {
        LocationSample::new(50.0 + i as f64 * 1e-4, 19.9, 10.0, Some(1.0), i * 5_000)
    }

    fn standing(i: i64) -> LocationSample {
        LocationSample::new(50.0, 19.9, 10.0, Some(0.0), i * 5_000)
    }

    struct Fixture {
        map: SimulatedMap,
        markers: SimulatedMap,
        layer: LayerHandle,
        store: TraceStore,
    }

    impl Fixture {
        fn new() -> Self {
            let mut map = SimulatedMap::default();
            let layer = map.add_overlay_layer("trace", true);
            Fixture {
                markers: map.clone(),
                map,
                layer,
                store: TraceStore::new(),
            }
        }

        fn draw_layer(&mut self) -> DrawLayer<'_> {
            DrawLayer::new(&mut self.map, &mut self.markers, self.layer)
        }

        fn append(&mut self, sample: &LocationSample, config: &FilterConfig) -> bool {
            let layer = self.layer;
            let mut draw = DrawLayer::new(&mut self.map, &mut self.markers, layer);
            self.store.append_if_accepted(sample, config, &mut draw)
        }
    }

    #[test]
    fn test_newest_fix_is_staged_not_drawn() {
        let mut fx = Fixture::new();
        let config = FilterConfig::default();

        assert!(fx.append(&moving(0), &config));
        assert_eq!(fx.store.len(), 1);
        assert_eq!(fx.store.points().count(), 0);
        assert_eq!(fx.map.visible_marker_count(), 0);

        // any later event draws the staged fix, even a rejected one
        assert!(!fx.append(&standing(1), &config));
        assert_eq!(fx.store.points().count(), 1);
        assert!(fx.store.staged().is_none());
        assert_eq!(fx.map.visible_marker_count(), 1);
        assert_eq!(fx.store.points().next().map(|p| *p.sample()), Some(moving(0)));
    }

    #[test]
    fn test_rejected_fixes_are_never_drawn() {
        let mut fx = Fixture::new();
        let config = FilterConfig::default();
        for i in 0..10 {
            fx.append(&standing(i), &config);
        }
        assert!(fx.store.is_empty());
        assert_eq!(fx.map.visible_marker_count(), 0);
    }

    #[test]
    fn test_length_limit_evicts_oldest_first() {
        let mut fx = Fixture::new();
        let config = FilterConfig {
            length_maximum: 3,
            ..FilterConfig::default()
        };
        for i in 0..6 {
            fx.append(&moving(i), &config);
            assert!(fx.store.len() <= 3);
        }
        let kept: Vec<i64> = fx.store.samples().map(|s| s.timestamp()).collect();
        assert_eq!(kept, vec![15_000, 20_000, 25_000]);
        assert_eq!(fx.map.visible_marker_count(), 2);
    }

    #[test]
    fn test_age_limit_evicts_old_points() {
        let mut fx = Fixture::new();
        let config = FilterConfig {
            age_maximum: 1,
            ..FilterConfig::default()
        };
        fx.append(&LocationSample::new(50.0, 19.9, 10.0, Some(1.0), 0), &config);
        fx.append(&LocationSample::new(50.0, 19.9, 10.0, Some(1.0), 30_000), &config);
        fx.append(&LocationSample::new(50.0, 19.9, 10.0, Some(1.0), 70_000), &config);
        let kept: Vec<i64> = fx.store.samples().map(|s| s.timestamp()).collect();
        assert_eq!(kept, vec![30_000, 70_000]);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let mut fx = Fixture::new();
        let config = FilterConfig::default();
        fx.append(&LocationSample::new(50.0, 19.9, 10.0, Some(1.0), i64::MIN), &config);
        fx.append(&LocationSample::new(50.0, 19.9, 10.0, Some(1.0), 0), &config);
        fx.append(&LocationSample::new(50.0, 19.9, 10.0, Some(1.0), i64::MAX), &config);
        // everything older than an hour before i64::MAX is gone
        let kept: Vec<i64> = fx.store.samples().map(|s| s.timestamp()).collect();
        assert_eq!(kept, vec![i64::MAX]);

        fx.append(&LocationSample::new(50.0, 19.9, 10.0, Some(1.0), i64::MIN), &config);
        assert_eq!(fx.store.len(), 2);
    }

    #[test]
    fn test_zero_length_keeps_nothing() {
        let mut fx = Fixture::new();
        let config = FilterConfig {
            length_maximum: 0,
            ..FilterConfig::default()
        };
        for i in 0..3 {
            fx.append(&moving(i), &config);
            assert_eq!(fx.store.len(), 0);
        }
    }

    #[test]
    fn test_clear_removes_markers() {
        let mut fx = Fixture::new();
        let config = FilterConfig::default();
        for i in 0..4 {
            fx.append(&moving(i), &config);
        }
        assert_eq!(fx.map.visible_marker_count(), 3);
        let mut store = std::mem::take(&mut fx.store);
        store.clear(&mut fx.draw_layer());
        fx.store = store;
        assert!(fx.store.is_empty());
        assert_eq!(fx.map.visible_marker_count(), 0);
    }
}
