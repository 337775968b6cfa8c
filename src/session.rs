//! Location watch lifecycle and routing of fixes to the trace, the follow controller and
//! the current position marker.
use crate::config::Config;
use crate::controls::{ButtonAction, GotoButton, Press};
use crate::filter::FilterConfig;
use crate::follow::{FollowConfig, FollowController, FollowDecision};
use crate::gps::{LocationError, LocationSample};
use crate::history;
use crate::services::{
    AffiliationProvider, DrawLayer, LayerHandle, LocationSource, MapView, MarkerFactory,
    MarkerHandle, MarkerStyle, Services, UserInterface, WatchHandle, WatchOptions,
};
use crate::trace::TraceStore;
use crate::Error;
use chrono::{TimeZone, Utc};
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};

/// Name of the overlay layer holding every marker of the session
pub const LAYER_NAME: &str = "Agent (self) location";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// [m] fixes less accurate than this are logged as suspicious
    pub accuracy_warning: f64,
    /// [m] fixes less accurate than this stop the watch
    pub accuracy_ceiling: f64,
    /// keep every received fix for [`LocationSession::dump`]
    pub keep_all_history: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            accuracy_warning: 20.0,
            accuracy_ceiling: 200.0,
            keep_all_history: true,
        }
    }
}

/// Called once with the first fix of a newly started watch
pub type FirstFixCallback = Box<dyn FnOnce(&mut LocationSession, &LocationSample)>;

struct ActiveWatch {
    handle: WatchHandle,
    user_initiated: bool,
    received_fix: bool,
    on_first_fix: Option<FirstFixCallback>,
}

/// Owns the location watch and everything drawn for it.
///
/// All methods run to completion on the host's event loop; location events must be
/// delivered in arrival order.
pub struct LocationSession {
    filter: FilterConfig,
    config: SessionConfig,
    source: Box<dyn LocationSource>,
    map: Box<dyn MapView>,
    markers: Box<dyn MarkerFactory>,
    affiliation: Box<dyn AffiliationProvider>,
    ui: Box<dyn UserInterface>,
    layer: Option<LayerHandle>,
    trace: TraceStore,
    follow: FollowController,
    watch: Option<ActiveWatch>,
    last_sample: Option<LocationSample>,
    history: Vec<LocationSample>,
    current_marker: Option<MarkerHandle>,
}

impl LocationSession {
    pub fn new(config: &Config, services: Services) -> Self {
        LocationSession {
            filter: config.filter().clone(),
            config: config.session().clone(),
            source: services.source,
            map: services.map,
            markers: services.markers,
            affiliation: services.affiliation,
            ui: services.ui,
            layer: None,
            trace: TraceStore::new(),
            follow: FollowController::new(config.follow().clone()),
            watch: None,
            last_sample: None,
            history: Vec::new(),
            current_marker: None,
        }
    }

    /// Register the draw layer and start a passive watch
    pub fn init(&mut self) {
        self.draw_layer_handle();
        self.start_watch(false, None);
    }

    pub fn filter_config(&self) -> &FilterConfig {
        &self.filter
    }

    /// Replace the filter, applies from the next fix on
    pub fn set_filter_config(&mut self, filter: FilterConfig) {
        self.filter = filter;
    }

    pub fn set_follow_config(&mut self, follow: FollowConfig) {
        self.follow.set_config(follow);
    }

    pub fn last_sample(&self) -> Option<&LocationSample> {
        self.last_sample.as_ref()
    }

    pub fn history(&self) -> &[LocationSample] {
        &self.history
    }

    pub fn trace(&self) -> &TraceStore {
        &self.trace
    }

    pub fn follow(&self) -> &FollowController {
        &self.follow
    }

    /// Map footprints are cached per zoom, the host calls this when the map is resized
    pub fn on_map_resize(&mut self) {
        self.follow.invalidate_footprints();
    }

    pub fn current_marker(&self) -> Option<MarkerHandle> {
        self.current_marker
    }

    pub fn layer(&self) -> Option<LayerHandle> {
        self.layer
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    pub fn watch_handle(&self) -> Option<WatchHandle> {
        self.watch.as_ref().map(|w| w.handle)
    }

    /// Start watching the location unless a watch is already active.
    ///
    /// `on_first_fix` runs once, after the first fix of the new watch has been processed.
    /// Returns true if a new watch was started.
    pub fn start_watch(
        &mut self,
        user_initiated: bool,
        on_first_fix: Option<FirstFixCallback>,
    ) -> bool {
        if let Some(watch) = &self.watch {
            debug!("location watch {:?} already active", watch.handle);
            return false;
        }
        match self.source.watch(&WatchOptions::default()) {
            Ok(handle) => {
                info!(
                    "started location watch {:?} (user initiated: {})",
                    handle, user_initiated
                );
                self.watch = Some(ActiveWatch {
                    handle,
                    user_initiated,
                    received_fix: false,
                    on_first_fix,
                });
                true
            }
            Err(e) => {
                self.report_source_error(e, user_initiated);
                false
            }
        }
    }

    pub fn stop_watch(&mut self) {
        if let Some(watch) = self.watch.take() {
            self.source.stop_watch(watch.handle);
            info!("stopped location watch {:?}", watch.handle);
        }
    }

    /// Deliver an event of the watch identified by `handle`, events of stopped watches
    /// are dropped.
    pub fn handle_event(
        &mut self,
        handle: WatchHandle,
        event: Result<LocationSample, LocationError>,
    ) {
        if self.watch_handle() != Some(handle) {
            debug!("ignoring event of inactive location watch {:?}", handle);
            return;
        }
        match event {
            Ok(sample) => self.receive(sample),
            Err(e) => self.receive_error(e),
        }
    }

    /// Process a fix
    pub fn receive(&mut self, sample: LocationSample) {
        self.log_location(&sample);
        if self.config.keep_all_history {
            self.history.push(sample);
        }
        self.last_sample = Some(sample);

        let accuracy = sample.accuracy();
        if !(accuracy <= self.config.accuracy_ceiling) {
            // most likely a stale or broken GPS, restarting is up to the user
            warn!(
                "{}, stopping location watch",
                Error::UnacceptableAccuracy(accuracy)
            );
            self.stop_watch();
            return;
        }
        if accuracy > self.config.accuracy_warning {
            warn!("low location accuracy: {} m", accuracy);
        }

        let layer = self.draw_layer_handle();
        {
            let mut draw = DrawLayer::new(self.map.as_mut(), self.markers.as_mut(), layer);
            self.trace
                .append_if_accepted(&sample, &self.filter, &mut draw);
        }
        let decision = self
            .follow
            .on_sample(&sample, &self.filter, self.map.as_mut());
        if let FollowDecision::Recentered(distance) = decision {
            debug!("followed location, distance from center was {:.1}", distance);
        } else {
            trace!("follow decision: {:?}", decision);
        }
        self.update_current_marker(&sample, layer);

        let callback = self.watch.as_mut().and_then(|watch| {
            watch.received_fix = true;
            watch.on_first_fix.take()
        });
        if let Some(callback) = callback {
            callback(self, &sample);
        }
    }

    /// Process an error of the active watch.
    ///
    /// The watch is always stopped. Only a user waiting on a watch they started gets an
    /// alert, everyone else just gets a log entry.
    pub fn receive_error(&mut self, error: LocationError) {
        let user_initiated = self
            .watch
            .as_ref()
            .map_or(false, |w| w.user_initiated && !w.received_fix);
        self.stop_watch();
        self.report_source_error(error, user_initiated);
    }

    fn report_source_error(&mut self, error: LocationError, user_initiated: bool) {
        let message = error.user_message(self.ui.is_mobile());
        let err = Error::SourceUnavailable(error);
        if user_initiated {
            error!("{}", err);
            self.ui.alert(&message);
        } else {
            warn!("{}", err);
        }
    }

    /// Center the map on the given fix or on the last one.
    ///
    /// Returns false if there is no fix to center on.
    pub fn center_map(&mut self, sample: Option<&LocationSample>) -> bool {
        let target = match sample.or_else(|| self.last_sample.as_ref()) {
            Some(target) => *target,
            None => {
                debug!("no location to center the map on");
                return false;
            }
        };
        let zoom = self.map.zoom();
        self.map.set_view(target.position(), zoom);
        self.follow.note_recentered(target.timestamp());
        true
    }

    /// Go to the current location, restarting the watch if it was stopped
    pub fn go_to_location(&mut self) {
        if self.is_watching() {
            self.center_map(None);
        } else {
            self.start_watch(true, Some(center_on_first_fix()));
        }
    }

    pub fn follow_start(&mut self) {
        self.follow.start();
        if self.is_watching() {
            self.center_map(None);
        } else {
            self.start_watch(true, Some(center_on_first_fix()));
        }
    }

    pub fn follow_end(&mut self) {
        self.follow.stop();
    }

    /// Run the action of a button press
    pub fn dispatch(&mut self, action: ButtonAction) {
        match action {
            ButtonAction::GoToLocation => self.go_to_location(),
            ButtonAction::FollowStart => self.follow_start(),
            ButtonAction::FollowEnd => self.follow_end(),
        }
    }

    /// Handle a press of the go-to button and keep its glyph in line with follow mode
    pub fn press_button(&mut self, button: &mut GotoButton, held_ms: u64) -> Press {
        button.sync_following(self.follow.is_following());
        let press = button.press(held_ms);
        self.dispatch(press.action);
        button.sync_following(self.follow.is_following());
        press
    }

    /// JSON array of all fixes received so far
    pub fn dump(&self) -> String {
        match history::dump(&self.history) {
            Ok(json) => json,
            Err(e) => {
                error!("unable to dump locations: {}", e);
                "[]".to_string()
            }
        }
    }

    /// Show location in debug log
    pub fn log_location(&self, sample: &LocationSample) {
        let time = match Utc.timestamp_millis_opt(sample.timestamp()).single() {
            Some(time) => time.to_rfc3339(),
            None => sample.timestamp().to_string(),
        };
        let speed = match sample.speed() {
            Some(speed) => speed.to_string(),
            None => "null".to_string(),
        };
        debug!(
            "{}; accuracy [m]: {}; speed [m/s]: {}; location: {}, {}",
            time,
            sample.accuracy(),
            speed,
            sample.latitude(),
            sample.longitude()
        );
    }

    fn draw_layer_handle(&mut self) -> LayerHandle {
        match self.layer {
            Some(layer) => layer,
            None => {
                let layer = self.map.add_overlay_layer(LAYER_NAME, true);
                self.layer = Some(layer);
                layer
            }
        }
    }

    fn update_current_marker(&mut self, sample: &LocationSample, layer: LayerHandle) {
        let mut draw = DrawLayer::new(self.map.as_mut(), self.markers.as_mut(), layer);
        if let Some(previous) = self.current_marker.take() {
            draw.erase(previous);
        }
        let style = MarkerStyle::current(sample.accuracy(), self.affiliation.current_team());
        self.current_marker = Some(draw.draw(sample.position(), &style));
    }
}

fn center_on_first_fix() -> FirstFixCallback {
    Box::new(|session: &mut LocationSession, sample: &LocationSample| {
        session.center_map(Some(sample));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::{LatLng, LocationErrorKind};
    use crate::services::simulated::{
        simulated_services, RecordingInterface, SimulatedMap, SimulatedSource,
    };
    use crate::services::Team;

    struct Fixture {
        map: SimulatedMap,
        source: SimulatedSource,
        ui: RecordingInterface,
        session: LocationSession,
    }

    fn fixture(config: &Config) -> Fixture {
        let map = SimulatedMap::new(LatLng::new(50.0, 20.0), 16, (800, 600));
        let source = SimulatedSource::new();
        let ui = RecordingInterface::new(false);
        let services = simulated_services(&map, &source, &ui, Team::Resistance);
        Fixture {
            session: LocationSession::new(config, services),
            map,
            source,
            ui,
        }
    }

    fn fix(accuracy: f64, timestamp: i64) -> LocationSample {
        LocationSample::new(50.001, 20.001, accuracy, Some(1.0), timestamp)
    }

    #[test]
    fn test_init_registers_layer_and_watch() {
        let mut fx = fixture(&Config::default());
        fx.session.init();
        assert_eq!(fx.map.layers(), vec![(LAYER_NAME.to_string(), true)]);
        assert!(fx.session.is_watching());
        let started = fx.source.started();
        assert_eq!(started.len(), 1);
        assert!(started[0].1.high_accuracy);
        assert_eq!(started[0].1.max_cache_age_ms, 0);
    }

    #[test]
    fn test_current_marker_is_replaced() {
        let mut fx = fixture(&Config::default());
        fx.session.init();
        fx.session.receive(fix(10.0, 0));
        let first = fx.session.current_marker().unwrap();
        fx.session.receive(fix(100.0, 1_000));
        let second = fx.session.current_marker().unwrap();
        assert_ne!(first, second);

        let layer = fx.session.layer().unwrap();
        let on_layer = fx.map.layer_markers(layer);
        assert!(!on_layer.contains(&first));
        assert!(on_layer.contains(&second));
        let (_, style) = fx.map.marker(second).unwrap();
        assert_eq!(style, MarkerStyle::current(100.0, Team::Resistance));
    }

    #[test]
    fn test_second_start_is_noop() {
        let mut fx = fixture(&Config::default());
        assert!(fx.session.start_watch(false, None));
        assert!(!fx.session.start_watch(true, None));
        assert_eq!(fx.source.started().len(), 1);
    }

    #[test]
    fn test_soft_low_accuracy_is_processed() {
        let mut fx = fixture(&Config::default());
        fx.session.init();
        fx.session.receive(fix(150.0, 0));
        assert!(fx.session.is_watching());
        assert!(fx.session.current_marker().is_some());
    }

    #[test]
    fn test_events_of_old_watch_are_ignored() {
        let mut fx = fixture(&Config::default());
        fx.session.init();
        let old = fx.session.watch_handle().unwrap();
        fx.session.stop_watch();
        fx.session.start_watch(false, None);
        fx.session.handle_event(old, Ok(fix(10.0, 0)));
        assert!(fx.session.last_sample().is_none());

        let current = fx.session.watch_handle().unwrap();
        fx.session.handle_event(current, Ok(fix(10.0, 0)));
        assert_eq!(fx.session.last_sample(), Some(&fix(10.0, 0)));
    }

    #[test]
    fn test_failed_user_start_alerts() {
        let mut fx = fixture(&Config::default());
        fx.source.fail_next_watch(LocationError::new(
            LocationErrorKind::Unsupported,
            "no geolocation",
        ));
        fx.session.go_to_location();
        assert!(!fx.session.is_watching());
        assert_eq!(fx.ui.alerts().len(), 1);
    }

    #[test]
    fn test_history_can_be_disabled() {
        let mut config = Config::default();
        config.set_session(SessionConfig {
            keep_all_history: false,
            ..SessionConfig::default()
        });
        let mut fx = fixture(&config);
        fx.session.init();
        fx.session.receive(fix(10.0, 0));
        assert!(fx.session.history().is_empty());
        assert_eq!(fx.session.dump(), "[]");
        assert!(fx.session.last_sample().is_some());
    }
}
