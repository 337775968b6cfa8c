//! Live self location on an interactive map: trace of past fixes, current position marker
//! and a map that follows the user.
pub mod cli;
pub mod config;
pub mod controls;
mod error;
pub mod filter;
pub mod follow;
pub mod gps;
pub mod history;
pub mod services;
pub mod session;
pub mod trace;

pub use config::Config;
pub use error::Error;
pub use filter::{should_keep_as_trace, FilterConfig};
pub use follow::{FollowConfig, FollowController, FollowDecision, FollowState, MinDistance};
pub use gps::{
    approximate_distance_meters, deg_to_rad, rad_to_deg, LatLng, LocationError,
    LocationErrorKind, LocationSample,
};
pub use session::{LocationSession, SessionConfig};
pub use trace::TraceStore;
