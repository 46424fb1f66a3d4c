//! Map view: the view state and the marker layers drawn over it.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::constants::{SUPERFUND_ENDPOINT, TRI_2023_ENDPOINT, VIOLATIONS_ENDPOINT};
use crate::error::{ConvertError, Result};
use crate::pipeline::processing::geo::LatLng;
use crate::snapshot::{DatasetSchema, DatasetSource};

pub mod markers;

pub use markers::{escape_html, LayerGroup, Marker, MarkerStyle};

pub const DEFAULT_CENTER: LatLng = LatLng { lat: 37.8, lon: -96.0 };
pub const DEFAULT_ZOOM: u8 = 4;
pub const TEMPORARY_MARKER_TTL_SECS: i64 = 10;

#[derive(Debug, Clone, PartialEq)]
struct TemporaryMarker {
    marker: Marker,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    center: LatLng,
    zoom: u8,
    layers: BTreeMap<String, LayerGroup>,
    temporary: Option<TemporaryMarker>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            layers: BTreeMap::new(),
            temporary: None,
        }
    }
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn set_view(&mut self, center: LatLng, zoom: u8) {
        debug!("View set to {},{} zoom {}", center.lat, center.lon, zoom);
        self.center = center;
        self.zoom = zoom;
    }

    /// Add or replace a named layer
    pub fn add_layer(&mut self, name: &str, layer: LayerGroup) {
        info!("Layer {}: {} markers", name, layer.len());
        self.layers.insert(name.to_string(), layer);
    }

    pub fn layer(&self, name: &str) -> Option<&LayerGroup> {
        self.layers.get(name)
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.keys().map(String::as_str).collect()
    }

    /// Place the search-result marker. At most one exists; a new one replaces the old.
    pub fn show_temporary_marker(&mut self, position: LatLng, label: &str, now: DateTime<Utc>) {
        self.temporary = Some(TemporaryMarker {
            marker: markers::temporary_marker(position, label),
            expires_at: now + Duration::seconds(TEMPORARY_MARKER_TTL_SECS),
        });
    }

    /// Drop the temporary marker once its time is up. Returns whether one was removed.
    pub fn expire_temporary(&mut self, now: DateTime<Utc>) -> bool {
        match &self.temporary {
            Some(temp) if now >= temp.expires_at => {
                self.temporary = None;
                true
            }
            _ => false,
        }
    }

    pub fn temporary_marker(&self) -> Option<&Marker> {
        self.temporary.as_ref().map(|t| &t.marker)
    }

    /// GeoJSON FeatureCollection of every marker, with the view in `properties`.
    pub fn to_geojson(&self) -> Value {
        let mut features: Vec<Value> = self
            .layers
            .iter()
            .flat_map(|(name, layer)| layer.markers.iter().map(move |m| feature(name, m)))
            .collect();
        if let Some(temp) = &self.temporary {
            features.push(feature("temporary", &temp.marker));
        }
        json!({
            "type": "FeatureCollection",
            "properties": {
                "center": [self.center.lat, self.center.lon],
                "zoom": self.zoom,
            },
            "features": features,
        })
    }
}

fn feature(layer: &str, marker: &Marker) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [marker.position.lon, marker.position.lat],
        },
        "properties": {
            "layer": layer,
            "popup": marker.popup,
            "style": marker.style,
        },
    })
}

async fn fetch_checked(source: &dyn DatasetSource, endpoint: &str, schema: DatasetSchema) -> Result<Value> {
    let payload = source.fetch(endpoint).await?;
    schema.validate(&payload)?;
    Ok(payload)
}

fn items<'a>(dataset: &str, payload: &'a Value) -> Result<&'a [Value]> {
    payload
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ConvertError::Schema {
            dataset: dataset.to_string(),
            message: "payload is not an array".to_string(),
        })
}

/// Build the default view with a layer per dataset. A dataset that fails to load is left off
/// the map; the other layers are still drawn.
pub async fn load_map(source: &dyn DatasetSource) -> MapView {
    let mut view = MapView::new();

    let superfund = fetch_checked(source, SUPERFUND_ENDPOINT, DatasetSchema::Superfund)
        .await
        .and_then(|doc| {
            let sites = doc.get("sites").cloned().unwrap_or(Value::Array(Vec::new()));
            Ok(markers::superfund_layer(items("superfund", &sites)?))
        });
    let tri = fetch_checked(source, TRI_2023_ENDPOINT, DatasetSchema::Tri)
        .await
        .and_then(|doc| Ok(markers::tri_layer(items("tri", &doc)?)));
    let violations = fetch_checked(source, VIOLATIONS_ENDPOINT, DatasetSchema::Violations)
        .await
        .and_then(|doc| Ok(markers::violations_layer(items("violations", &doc)?)));

    for (name, layer) in [("superfund", superfund), ("tri", tri), ("violations", violations)] {
        match layer {
            Ok(layer) => view.add_layer(name, layer),
            Err(e) => warn!("Error loading {} markers: {}", name, e),
        }
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn default_view_is_the_continental_us() {
        let view = MapView::new();
        assert_eq!(view.center(), LatLng { lat: 37.8, lon: -96.0 });
        assert_eq!(view.zoom(), 4);
        assert!(view.layer_names().is_empty());
    }

    #[test]
    fn temporary_marker_is_replaced_and_expires() {
        let mut view = MapView::new();
        view.show_temporary_marker(LatLng { lat: 1.0, lon: 2.0 }, "First", at(0));
        view.show_temporary_marker(LatLng { lat: 3.0, lon: 4.0 }, "Second", at(5));
        assert_eq!(view.temporary_marker().unwrap().popup, "<strong>Second</strong>");

        // the replacement carries its own 10 s window
        assert!(!view.expire_temporary(at(12)));
        assert!(view.temporary_marker().is_some());
        assert!(view.expire_temporary(at(15)));
        assert!(view.temporary_marker().is_none());
        assert!(!view.expire_temporary(at(30)));
    }

    #[test]
    fn geojson_lists_layers_and_view() {
        let mut view = MapView::new();
        view.add_layer(
            "superfund",
            markers::superfund_layer(&[serde_json::json!({"site_name": "Test Site", "lat": 38.9, "lon": -77.0})]),
        );
        view.set_view(LatLng { lat: 38.9, lon: -77.0 }, 11);
        view.show_temporary_marker(LatLng { lat: 38.9, lon: -77.0 }, "", at(0));

        let doc = view.to_geojson();
        assert_eq!(doc["type"], "FeatureCollection");
        assert_eq!(doc["properties"]["zoom"], 11);
        let features = doc["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["geometry"]["coordinates"], serde_json::json!([-77.0, 38.9]));
        assert_eq!(features[0]["properties"]["style"]["fillColor"], "blue");
        assert_eq!(features[1]["properties"]["layer"], "temporary");
        assert_eq!(features[1]["properties"]["popup"], "<strong>Location</strong>");
    }
}
