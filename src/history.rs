//! Dump format of the fix history
use crate::gps::LocationSample;
use crate::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Serialize, Deserialize)]
struct Coordinates {
    latitude: f64,
    longitude: f64,
}

/// One fix in the dump, field names are kept compatible with what browsers report.
///
/// JSON has no NaN or infinity, those are written as the strings `"NaN"`, `"Infinity"`
/// and `"-Infinity"`. A `null` accuracy (as browsers serialize NaN) reads back as NaN;
/// a `null` speed means the speed is unknown.
#[derive(Debug, Serialize, Deserialize)]
struct DumpEntry {
    ll: Coordinates,
    #[serde(
        serialize_with = "serialize_float",
        deserialize_with = "deserialize_accuracy"
    )]
    accuracy: f64,
    #[serde(
        default,
        serialize_with = "serialize_optional_float",
        deserialize_with = "deserialize_optional_float"
    )]
    speed: Option<f64>,
    timestamp: i64,
}

/// A float as it may appear in a dump
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DumpFloat {
    Number(f64),
    Text(String),
}

impl DumpFloat {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            DumpFloat::Number(value) => Ok(value),
            DumpFloat::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                _ => Err(E::custom(format!("invalid number: {}", text))),
            },
        }
    }
}

fn non_finite_text(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn serialize_float<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_str(non_finite_text(*value))
    }
}

fn serialize_optional_float<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(value) => serialize_float(value, serializer),
        None => serializer.serialize_none(),
    }
}

fn deserialize_accuracy<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<DumpFloat>::deserialize(deserializer)? {
        Some(value) => value.into_f64(),
        None => Ok(f64::NAN),
    }
}

fn deserialize_optional_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<DumpFloat>::deserialize(deserializer)? {
        Some(value) => value.into_f64().map(Some),
        None => Ok(None),
    }
}

impl From<&LocationSample> for DumpEntry {
    fn from(sample: &LocationSample) -> Self {
        DumpEntry {
            ll: Coordinates {
                latitude: sample.latitude(),
                longitude: sample.longitude(),
            },
            accuracy: sample.accuracy(),
            speed: sample.speed(),
            timestamp: sample.timestamp(),
        }
    }
}

impl From<DumpEntry> for LocationSample {
    fn from(entry: DumpEntry) -> Self {
        LocationSample::new(
            entry.ll.latitude,
            entry.ll.longitude,
            entry.accuracy,
            entry.speed,
            entry.timestamp,
        )
    }
}

/// Serialize fixes into a JSON array
pub fn dump(samples: &[LocationSample]) -> Result<String, Error> {
    let entries: Vec<DumpEntry> = samples.iter().map(DumpEntry::from).collect();
    Ok(serde_json::to_string(&entries)?)
}

/// Read fixes back from a JSON array created by [`dump`]
pub fn parse_dump(json: &str) -> Result<Vec<LocationSample>, Error> {
    let entries: Vec<DumpEntry> = serde_json::from_str(json)?;
    Ok(entries.into_iter().map(LocationSample::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_dump_field_layout() {
        let samples = [
            LocationSample::new(54.352025, 18.646638, 12.5, Some(1.25), 1_500_000_000_123),
            LocationSample::new(54.3521, 18.6467, 40.0, None, 1_500_000_001_123),
        ];
        let json: Value = serde_json::from_str(&dump(&samples).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["ll"]["latitude"], 54.352025);
        assert_eq!(entries[0]["ll"]["longitude"], 18.646638);
        assert_eq!(entries[0]["accuracy"], 12.5);
        assert_eq!(entries[0]["speed"], 1.25);
        assert_eq!(entries[0]["timestamp"], 1_500_000_000_123i64);
        assert!(entries[1]["speed"].is_null());
    }

    #[test]
    fn test_parse_dump() {
        let json = r#"[{"ll":{"latitude":50.06,"longitude":19.94},"accuracy":8,"speed":null,"timestamp":42}]"#;
        let samples = parse_dump(json).unwrap();
        assert_eq!(samples, vec![LocationSample::new(50.06, 19.94, 8.0, None, 42)]);
    }

    #[test]
    fn test_non_finite_values_read_back() {
        let samples = [
            LocationSample::new(50.0, 19.9, f64::NAN, Some(f64::NAN), 1),
            LocationSample::new(50.0, 19.9, f64::INFINITY, Some(f64::NEG_INFINITY), 2),
            LocationSample::new(50.0, 19.9, 5.0, None, 3),
        ];
        let json = dump(&samples).unwrap();
        let parsed = parse_dump(&json).unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(parsed[0].accuracy().is_nan());
        assert!(parsed[0].speed().map_or(false, |s| s.is_nan()));
        assert_eq!(parsed[1].accuracy(), f64::INFINITY);
        assert_eq!(parsed[1].speed(), Some(f64::NEG_INFINITY));
        assert_eq!(parsed[2], samples[2]);
    }

    #[test]
    fn test_null_accuracy_is_nan() {
        let json = r#"[{"ll":{"latitude":1.0,"longitude":2.0},"accuracy":null,"speed":null,"timestamp":7}]"#;
        let samples = parse_dump(json).unwrap();
        assert!(samples[0].accuracy().is_nan());
        assert_eq!(samples[0].speed(), None);
        assert!(parse_dump(r#"[{"ll":{"latitude":1.0,"longitude":2.0},"accuracy":"far","speed":null,"timestamp":7}]"#).is_err());
    }

    #[test]
    fn test_empty_dump() {
        assert_eq!(dump(&[]).unwrap(), "[]");
        assert!(parse_dump("{}").is_err());
    }
}
