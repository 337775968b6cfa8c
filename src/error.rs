//! Defines the general error type for the crate and various conversions into it
use crate::gps::LocationError;
use std::convert;
use std::fmt;

/// General error type for the crate
#[derive(Debug)]
pub enum Error {
    InvalidConfigurationValue(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Other(String),
    SourceUnavailable(LocationError),
    UnacceptableAccuracy(f64),
    Yaml(serde_yaml::Error),
}

impl convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl convert::From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl convert::From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}

impl convert::From<LocationError> for Error {
    fn from(err: LocationError) -> Error {
        Error::SourceUnavailable(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfigurationValue(msg) => write!(f, "{}", msg),
            Error::Io(e) => write!(f, "{}", e),
            Error::Json(e) => write!(f, "{}", e),
            Error::Other(msg) => write!(f, "{}", msg),
            Error::SourceUnavailable(e) => write!(f, "location error({}): {}", e.code(), e),
            Error::UnacceptableAccuracy(accuracy) => write!(
                f,
                "location accuracy of {} m is beyond the acceptable ceiling",
                accuracy
            ),
            Error::Yaml(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}
