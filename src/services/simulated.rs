//! In-memory host services used by the replay tool and by tests.
//!
//! Every service is a cheap handle to shared state, keep a clone around to inspect what
//! the session did with it.
use super::{
    AffiliationProvider, LatLngBounds, LayerHandle, LocationSource, MapView, MarkerFactory,
    MarkerHandle, MarkerStyle, Services, Team, UserInterface, WatchHandle, WatchOptions,
};
use crate::gps::{deg_to_rad, rad_to_deg, LatLng, LocationError, EARTH_RADIUS_METERS};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Web mercator ground resolution at the equator for zoom 0, in meters per pixel
const EQUATOR_METERS_PER_PIXEL: f64 = 156_543.033_92;

#[derive(Debug)]
struct MapState {
    center: LatLng,
    zoom: u32,
    viewport: (u32, u32),
    layers: Vec<(String, bool)>,
    layer_contents: HashMap<LayerHandle, Vec<MarkerHandle>>,
    markers: HashMap<MarkerHandle, (LatLng, MarkerStyle)>,
    next_marker: u64,
    set_view_calls: Vec<(LatLng, u32)>,
    bounds_requests: Cell<usize>,
}

/// A map viewport of a fixed pixel size using web mercator scale
#[derive(Clone, Debug)]
pub struct SimulatedMap {
    state: Rc<RefCell<MapState>>,
}

impl SimulatedMap {
    pub fn new(center: LatLng, zoom: u32, viewport: (u32, u32)) -> Self {
        SimulatedMap {
            state: Rc::new(RefCell::new(MapState {
                center,
                zoom,
                viewport,
                layers: Vec::new(),
                layer_contents: HashMap::new(),
                markers: HashMap::new(),
                next_marker: 1,
                set_view_calls: Vec::new(),
                bounds_requests: Cell::new(0),
            })),
        }
    }

    /// Change zoom the way a user would, without recording a set_view call
    pub fn set_zoom(&self, zoom: u32) {
        self.state.borrow_mut().zoom = zoom;
    }

    pub fn layers(&self) -> Vec<(String, bool)> {
        self.state.borrow().layers.clone()
    }

    pub fn set_view_calls(&self) -> Vec<(LatLng, u32)> {
        self.state.borrow().set_view_calls.clone()
    }

    pub fn bounds_requests(&self) -> usize {
        self.state.borrow().bounds_requests.get()
    }

    /// Markers currently added to the given layer, in insertion order
    pub fn layer_markers(&self, layer: LayerHandle) -> Vec<MarkerHandle> {
        self.state
            .borrow()
            .layer_contents
            .get(&layer)
            .cloned()
            .unwrap_or_default()
    }

    /// Count of markers on any layer
    pub fn visible_marker_count(&self) -> usize {
        self.state
            .borrow()
            .layer_contents
            .values()
            .map(|m| m.len())
            .sum()
    }

    pub fn marker(&self, marker: MarkerHandle) -> Option<(LatLng, MarkerStyle)> {
        self.state.borrow().markers.get(&marker).cloned()
    }
}

impl Default for SimulatedMap {
    fn default() -> Self {
        SimulatedMap::new(LatLng::default(), 17, (800, 600))
    }
}

impl MapView for SimulatedMap {
    fn add_overlay_layer(&mut self, name: &str, visible_by_default: bool) -> LayerHandle {
        let mut state = self.state.borrow_mut();
        state.layers.push((name.to_string(), visible_by_default));
        let layer = LayerHandle(state.layers.len() as u64);
        state.layer_contents.insert(layer, Vec::new());
        layer
    }

    fn add_to_layer(&mut self, layer: LayerHandle, marker: MarkerHandle) {
        self.state
            .borrow_mut()
            .layer_contents
            .entry(layer)
            .or_insert_with(Vec::new)
            .push(marker);
    }

    fn remove_from_layer(&mut self, layer: LayerHandle, marker: MarkerHandle) {
        if let Some(markers) = self.state.borrow_mut().layer_contents.get_mut(&layer) {
            markers.retain(|m| *m != marker);
        }
    }

    fn zoom(&self) -> u32 {
        self.state.borrow().zoom
    }

    fn center(&self) -> LatLng {
        self.state.borrow().center
    }

    fn bounds(&self) -> LatLngBounds {
        let state = self.state.borrow();
        state.bounds_requests.set(state.bounds_requests.get() + 1);

        let cos_lat = deg_to_rad(state.center.lat).cos();
        let meters_per_pixel = EQUATOR_METERS_PER_PIXEL * cos_lat / 2f64.powi(state.zoom as i32);
        let half_width = f64::from(state.viewport.0) / 2.0 * meters_per_pixel;
        let half_height = f64::from(state.viewport.1) / 2.0 * meters_per_pixel;
        let d_lat = rad_to_deg(half_height / EARTH_RADIUS_METERS);
        let d_lng = rad_to_deg(half_width / (EARTH_RADIUS_METERS * cos_lat));
        LatLngBounds {
            south: state.center.lat - d_lat,
            west: state.center.lng - d_lng,
            north: state.center.lat + d_lat,
            east: state.center.lng + d_lng,
        }
    }

    fn set_view(&mut self, center: LatLng, zoom: u32) {
        let mut state = self.state.borrow_mut();
        state.center = center;
        state.zoom = zoom;
        state.set_view_calls.push((center, zoom));
    }
}

impl MarkerFactory for SimulatedMap {
    fn circle_marker(&mut self, position: LatLng, style: &MarkerStyle) -> MarkerHandle {
        let mut state = self.state.borrow_mut();
        let marker = MarkerHandle(state.next_marker);
        state.next_marker += 1;
        state.markers.insert(marker, (position, style.clone()));
        marker
    }
}

#[derive(Debug, Default)]
struct SourceState {
    next_handle: u64,
    active: Option<WatchHandle>,
    started: Vec<(WatchHandle, WatchOptions)>,
    stopped: Vec<WatchHandle>,
    fail_next: Option<LocationError>,
}

/// Location source that only hands out watch handles, fixes are fed by the caller
#[derive(Clone, Debug, Default)]
pub struct SimulatedSource {
    state: Rc<RefCell<SourceState>>,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next watch request fail with the given error
    pub fn fail_next_watch(&self, error: LocationError) {
        self.state.borrow_mut().fail_next = Some(error);
    }

    pub fn active(&self) -> Option<WatchHandle> {
        self.state.borrow().active
    }

    pub fn started(&self) -> Vec<(WatchHandle, WatchOptions)> {
        self.state.borrow().started.clone()
    }

    pub fn stopped(&self) -> Vec<WatchHandle> {
        self.state.borrow().stopped.clone()
    }
}

impl LocationSource for SimulatedSource {
    fn watch(&mut self, options: &WatchOptions) -> Result<WatchHandle, LocationError> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        state.next_handle += 1;
        let handle = WatchHandle(state.next_handle);
        state.active = Some(handle);
        state.started.push((handle, *options));
        Ok(handle)
    }

    fn stop_watch(&mut self, handle: WatchHandle) {
        let mut state = self.state.borrow_mut();
        if state.active == Some(handle) {
            state.active = None;
        }
        state.stopped.push(handle);
    }
}

/// User interface that records alerts instead of showing them
#[derive(Clone, Debug, Default)]
pub struct RecordingInterface {
    alerts: Rc<RefCell<Vec<String>>>,
    mobile: bool,
}

impl RecordingInterface {
    pub fn new(mobile: bool) -> Self {
        RecordingInterface {
            alerts: Rc::new(RefCell::new(Vec::new())),
            mobile,
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }
}

impl UserInterface for RecordingInterface {
    fn alert(&mut self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn is_mobile(&self) -> bool {
        self.mobile
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTeam(pub Team);

impl AffiliationProvider for FixedTeam {
    fn current_team(&self) -> Team {
        self.0
    }
}

/// Bundle simulated services for a session, the caller keeps the originals for inspection
pub fn simulated_services(
    map: &SimulatedMap,
    source: &SimulatedSource,
    ui: &RecordingInterface,
    team: Team,
) -> Services {
    Services {
        source: Box::new(source.clone()),
        map: Box::new(map.clone()),
        markers: Box::new(map.clone()),
        affiliation: Box::new(FixedTeam(team)),
        ui: Box::new(ui.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_match_viewport() {
        let map = SimulatedMap::new(LatLng::new(0.0, 0.0), 17, (800, 600));
        let bounds = map.bounds();
        let expected_height = 600.0 * EQUATOR_METERS_PER_PIXEL / 2f64.powi(17);
        assert!((bounds.shorter_side_meters() - expected_height).abs() < 0.01);
        assert_eq!(map.bounds_requests(), 1);
    }

    #[test]
    fn test_source_hands_out_new_handles() {
        let mut source = SimulatedSource::new();
        let first = source.watch(&WatchOptions::default()).unwrap();
        source.stop_watch(first);
        let second = source.watch(&WatchOptions::default()).unwrap();
        assert_ne!(first, second);
        assert_eq!(source.active(), Some(second));
        assert_eq!(source.stopped(), vec![first]);
    }
}
