//! Store application configuration that gets read from disk
use crate::filter::FilterConfig;
use crate::follow::{FollowConfig, MinDistance};
use crate::session::SessionConfig;
use crate::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use simplelog::LevelFilter;
use std::io::prelude::*;
use std::str::FromStr;

/// Configuration struct that we can create from the config file used
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(
        deserialize_with = "deserialize_level_filter",
        serialize_with = "serialize_level_filter",
        default = "default_level_filter"
    )]
    log_level: LevelFilter,
    #[serde(default)]
    filter: FilterConfig,
    #[serde(default)]
    follow: FollowConfig,
    #[serde(default)]
    session: SessionConfig,
}

impl Config {
    pub fn load<T: Read>(source: &mut T) -> Result<Self, Error> {
        let config: Config = serde_yaml::from_reader(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn filter(&self) -> &FilterConfig {
        &self.filter
    }

    pub fn follow(&self) -> &FollowConfig {
        &self.follow
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn set_filter(&mut self, filter: FilterConfig) {
        self.filter = filter;
    }

    pub fn set_follow(&mut self, follow: FollowConfig) {
        self.follow = follow;
    }

    pub fn set_session(&mut self, session: SessionConfig) {
        self.session = session;
    }

    /// Check that all thresholds are usable numbers
    pub fn validate(&self) -> Result<(), Error> {
        let min_distance = match self.follow.min_distance {
            MinDistance::Meters(v) | MinDistance::Percent(v) => v,
        };
        let thresholds = [
            ("filter.accuracy_minimum", self.filter.accuracy_minimum),
            ("filter.speed_minimum", self.filter.speed_minimum),
            ("follow.min_interval", self.follow.min_interval),
            ("follow.min_distance", min_distance),
            ("session.accuracy_warning", self.session.accuracy_warning),
            ("session.accuracy_ceiling", self.session.accuracy_ceiling),
        ];
        for (key, value) in thresholds.iter() {
            if !value.is_finite() || *value < 0.0 {
                return Err(Error::InvalidConfigurationValue(format!(
                    "invalid value for {}, expected a non-negative number: {}",
                    key, value
                )));
            }
        }
        if self.session.accuracy_warning > self.session.accuracy_ceiling {
            return Err(Error::InvalidConfigurationValue(format!(
                "session.accuracy_warning ({}) must not exceed session.accuracy_ceiling ({})",
                self.session.accuracy_warning, self.session.accuracy_ceiling
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_level_filter(),
            filter: FilterConfig::default(),
            follow: FollowConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

fn deserialize_level_filter<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let buf = String::deserialize(deserializer)?;
    LevelFilter::from_str(&buf)
        .map_err(|_| serde::de::Error::custom(format!("invalid level value: {}", buf)))
}

fn serialize_level_filter<S>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&level.to_string())
}

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sections_use_defaults() {
        let config = Config::load(&mut "log_level: debug\n".as_bytes()).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert_eq!(config.filter(), &FilterConfig::default());
        assert_eq!(config.follow(), &FollowConfig::default());
        assert_eq!(config.session(), &SessionConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let yaml = "
filter:
  accuracy_minimum: 15
  length_maximum: 50
follow:
  min_distance:
    meters: 25
  min_zoom: 15
session:
  keep_all_history: false
";
        let config = Config::load(&mut yaml.as_bytes()).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Info);
        assert_eq!(config.filter().accuracy_minimum, 15.0);
        assert_eq!(config.filter().speed_minimum, 0.2);
        assert_eq!(config.filter().length_maximum, 50);
        assert_eq!(config.follow().min_distance, MinDistance::Meters(25.0));
        assert_eq!(config.follow().min_zoom, 15);
        assert_eq!(config.follow().longpress, 1500);
        assert!(!config.session().keep_all_history);
        assert_eq!(config.session().accuracy_ceiling, 200.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let yaml = "filter:\n  speed_minimum: -1\n";
        match Config::load(&mut yaml.as_bytes()) {
            Err(Error::InvalidConfigurationValue(msg)) => {
                assert!(msg.contains("filter.speed_minimum"))
            }
            other => panic!("unexpected result {:?}", other),
        }

        let yaml = "session:\n  accuracy_warning: 300\n";
        assert!(matches!(
            Config::load(&mut yaml.as_bytes()),
            Err(Error::InvalidConfigurationValue(_))
        ));

        assert!(matches!(
            Config::load(&mut "log_level: loud\n".as_bytes()),
            Err(Error::Yaml(_))
        ));
    }
}
