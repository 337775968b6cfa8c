//! Service module that defines the interfaces to the host map, the location API and the
//! user facing page.
use crate::gps::{LatLng, LocationError};
use serde::{Deserialize, Serialize};

pub mod simulated;

/// Opaque id of an overlay layer registered with the map
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct LayerHandle(pub u64);

/// Opaque id of a drawn marker
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct MarkerHandle(pub u64);

/// Opaque id of an active location watch
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct WatchHandle(pub u64);

/// Visible map area in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    /// Length of the shorter side of the area in meters
    pub fn shorter_side_meters(&self) -> f64 {
        let mid_lat = (self.south + self.north) / 2.0;
        let mid_lng = (self.west + self.east) / 2.0;
        let width = LatLng::new(mid_lat, self.west).distance_to(&LatLng::new(mid_lat, self.east));
        let height =
            LatLng::new(self.south, mid_lng).distance_to(&LatLng::new(self.north, mid_lng));
        width.min(height)
    }
}

/// Options passed along when a watch is started
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// 0 means cached positions are never acceptable
    pub max_cache_age_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions {
            high_accuracy: true,
            max_cache_age_ms: 0,
        }
    }
}

/// Faction of the player, only used to pick marker colors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Enlightened,
    Resistance,
}

/// Marker radius is either geographic or fixed on screen
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarkerRadius {
    Meters(f64),
    Pixels(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius: MarkerRadius,
    pub weight: u32,
    pub stroke_color: &'static str,
    pub fill_color: &'static str,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl MarkerStyle {
    /// Style of the current position marker, sized by its accuracy
    pub fn current(accuracy: f64, team: Team) -> Self {
        let radius = if accuracy > 50.0 {
            50.0
        } else if accuracy < 5.0 {
            5.0
        } else {
            accuracy
        };
        MarkerStyle {
            radius: MarkerRadius::Meters(radius),
            weight: 5,
            stroke_color: "gold",
            fill_color: match team {
                Team::Enlightened => "green",
                Team::Resistance => "blue",
            },
            opacity: 1.0,
            fill_opacity: 0.2,
        }
    }

    /// Style of a past position
    pub fn trace() -> Self {
        MarkerStyle {
            radius: MarkerRadius::Pixels(5.0),
            weight: 5,
            stroke_color: "red",
            fill_color: "red",
            opacity: 0.2,
            fill_opacity: 0.1,
        }
    }
}

/// trait that defines what the session needs from the host map
pub trait MapView {
    fn add_overlay_layer(&mut self, name: &str, visible_by_default: bool) -> LayerHandle;
    fn add_to_layer(&mut self, layer: LayerHandle, marker: MarkerHandle);
    fn remove_from_layer(&mut self, layer: LayerHandle, marker: MarkerHandle);
    fn zoom(&self) -> u32;
    fn center(&self) -> LatLng;
    fn bounds(&self) -> LatLngBounds;
    fn set_view(&mut self, center: LatLng, zoom: u32);
}

/// trait that creates circle markers, they're not visible until added to a layer
pub trait MarkerFactory {
    fn circle_marker(&mut self, position: LatLng, style: &MarkerStyle) -> MarkerHandle;
}

/// trait for a device location API pushing fixes asynchronously.
///
/// Fixes and errors are delivered by the host through
/// [`LocationSession::handle_event`](crate::LocationSession::handle_event) together with the
/// handle returned here.
pub trait LocationSource {
    fn watch(&mut self, options: &WatchOptions) -> Result<WatchHandle, LocationError>;
    fn stop_watch(&mut self, handle: WatchHandle);
}

pub trait AffiliationProvider {
    fn current_team(&self) -> Team;
}

/// Blocking messages shown to the user
pub trait UserInterface {
    fn alert(&mut self, message: &str);

    /// Whether the page runs in a mobile browser, changes the hints in alerts
    fn is_mobile(&self) -> bool {
        false
    }
}

/// Host services bundled together for a session
pub struct Services {
    pub source: Box<dyn LocationSource>,
    pub map: Box<dyn MapView>,
    pub markers: Box<dyn MarkerFactory>,
    pub affiliation: Box<dyn AffiliationProvider>,
    pub ui: Box<dyn UserInterface>,
}

/// Draws markers into one overlay layer of the map
pub struct DrawLayer<'a> {
    map: &'a mut dyn MapView,
    markers: &'a mut dyn MarkerFactory,
    layer: LayerHandle,
}

impl<'a> DrawLayer<'a> {
    pub fn new(
        map: &'a mut dyn MapView,
        markers: &'a mut dyn MarkerFactory,
        layer: LayerHandle,
    ) -> Self {
        DrawLayer {
            map,
            markers,
            layer,
        }
    }

    pub fn draw(&mut self, position: LatLng, style: &MarkerStyle) -> MarkerHandle {
        let marker = self.markers.circle_marker(position, style);
        self.map.add_to_layer(self.layer, marker);
        marker
    }

    pub fn erase(&mut self, marker: MarkerHandle) {
        self.map.remove_from_layer(self.layer, marker);
    }
}
