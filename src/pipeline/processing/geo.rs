use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize::fields::COORDINATE_PAIRS;
use super::normalize::{parse_number, NormalizedRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    /// Both components must be finite numbers
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        (lat.is_finite() && lon.is_finite()).then_some(Self { lat, lon })
    }
}

/// Coordinates of a normalized source record: the first accepted key pair where both values parse
/// to finite numbers.
pub fn coordinates(record: &NormalizedRecord) -> Option<LatLng> {
    COORDINATE_PAIRS.iter().find_map(|(lat_key, lon_key)| {
        let lat = record.get(lat_key).and_then(parse_number)?;
        let lon = record.get(lon_key).and_then(parse_number)?;
        LatLng::new(lat, lon)
    })
}

const SNAPSHOT_LAT_KEYS: &[&str] = &["latitude", "lat"];
const SNAPSHOT_LON_KEYS: &[&str] = &["longitude", "lng", "lon"];

/// Coordinates of an emitted snapshot entry, as the page reads them. The first non-null key
/// decides; a value that is not a finite number excludes the entry.
///
/// Every geo-dependent view (the TRI facility count and every marker layer) goes through this one
/// filter so the numbers shown never disagree with the markers plotted.
pub fn geolocated(item: &Value) -> Option<LatLng> {
    let lat = first_non_null(item, SNAPSHOT_LAT_KEYS).and_then(value_number)?;
    let lon = first_non_null(item, SNAPSHOT_LON_KEYS).and_then(value_number)?;
    LatLng::new(lat, lon)
}

fn first_non_null<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| item.get(key))
        .find(|value| !value.is_null())
}

/// Numeric reading of a JSON value: numbers as-is, strings parsed leniently.
pub fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::normalize::normalize;
    use serde_json::json;

    fn coords_of(value: Value) -> Option<LatLng> {
        coordinates(&normalize(value.as_object().unwrap()))
    }

    #[test]
    fn geojson_point_is_lon_lat() {
        let c = coords_of(json!({"geometry.coordinates.0": -77.0, "geometry.coordinates.1": 38.9}));
        assert_eq!(c, Some(LatLng { lat: 38.9, lon: -77.0 }));
    }

    #[test]
    fn geometry_is_preferred_over_attributes() {
        let c = coords_of(json!({
            "geometry.x": -90.0, "geometry.y": 35.0,
            "Latitude": 1.0, "Longitude": 2.0
        }));
        assert_eq!(c, Some(LatLng { lat: 35.0, lon: -90.0 }));
    }

    #[test]
    fn accepts_alternate_spellings() {
        assert!(coords_of(json!({"lat": "40.1", "lng": "-75.2"})).is_some());
        assert!(coords_of(json!({"FAC_LAT": "40.1", "FAC_LONG": "-75.2"})).is_some());
    }

    #[test]
    fn missing_or_non_numeric_coordinates_are_rejected() {
        assert_eq!(coords_of(json!({"LATITUDE": "40.1"})), None);
        assert_eq!(coords_of(json!({"LATITUDE": "", "LONGITUDE": ""})), None);
        assert_eq!(coords_of(json!({"LATITUDE": "north", "LONGITUDE": "-75"})), None);
    }

    #[test]
    fn snapshot_filter_reads_page_key_spellings() {
        assert!(geolocated(&json!({"lat": 38.9, "lon": -77.0})).is_some());
        assert!(geolocated(&json!({"latitude": "38.9", "lng": "-77.0"})).is_some());
        assert!(geolocated(&json!({"latitude": null, "lat": 38.9, "lon": -77.0})).is_some());
        assert!(geolocated(&json!({"lat": null, "lon": -77.0})).is_none());
        assert!(geolocated(&json!({"lat": "x", "lon": -77.0})).is_none());
        assert!(geolocated(&json!({"facility": "no coords"})).is_none());
    }
}
