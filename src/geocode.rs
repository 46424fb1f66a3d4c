//! Place search against a Nominatim-style geocoder, driving the map view.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::ports::HttpClientPort;
use crate::config::GeocoderConfig;
use crate::error::{ConvertError, Result};
use crate::map::MapView;
use crate::pipeline::processing::geo::{value_number, LatLng};

const FALLBACK_LABEL: &str = "Selected location";

/// One entry of the geocoder's result array. Coordinates arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeMatch {
    #[serde(default)]
    pub lat: Value,
    #[serde(default)]
    pub lon: Value,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl GeocodeMatch {
    pub fn position(&self) -> Option<LatLng> {
        LatLng::new(value_number(&self.lat)?, value_number(&self.lon)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Centered { label: String, position: LatLng, zoom: u8 },
    NoLocation,
    InvalidCoordinates,
    SearchError(String),
}

impl fmt::Display for GeocodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeOutcome::Centered { label, .. } => write!(f, "Centered on {label}"),
            GeocodeOutcome::NoLocation => write!(f, "No location found"),
            GeocodeOutcome::InvalidCoordinates => write!(f, "Invalid coordinates received"),
            GeocodeOutcome::SearchError(_) => write!(f, "Search error, try refining your query"),
        }
    }
}

/// Cities and towns get a wider view than postcodes; anything else is treated as an address.
pub fn pick_zoom(item: &GeocodeMatch) -> u8 {
    let class = item.class.as_deref().unwrap_or("");
    let kind = item.kind.as_deref().unwrap_or("");
    if class == "place" && matches!(kind, "city" | "town" | "village") {
        11
    } else if kind == "postcode" {
        10
    } else {
        14
    }
}

/// First three comma-separated parts of the display name
pub fn format_label(item: &GeocodeMatch) -> String {
    let display = item.display_name.as_deref().unwrap_or("");
    let short = display
        .split(',')
        .map(str::trim)
        .take(3)
        .collect::<Vec<_>>()
        .join(", ");
    if short.is_empty() {
        FALLBACK_LABEL.to_string()
    } else {
        short
    }
}

pub struct Geocoder {
    http: Arc<dyn HttpClientPort>,
    config: GeocoderConfig,
}

impl Geocoder {
    pub fn new(http: Arc<dyn HttpClientPort>, config: GeocoderConfig) -> Self {
        Self { http, config }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<GeocodeMatch>> {
        let limit = self.config.limit.to_string();
        let params = [
            ("q", query),
            ("format", "json"),
            ("addressdetails", "1"),
            ("limit", limit.as_str()),
        ];
        let resp = self.http.get(&self.config.base_url, &params).await?;
        if !resp.is_success() {
            return Err(ConvertError::Api {
                message: format!("Geocoding failed: {}", resp.status),
            });
        }
        let results: Vec<GeocodeMatch> = serde_json::from_slice(&resp.bytes)?;
        Ok(results)
    }

    /// Search, then center `view` on the top match with a temporary marker.
    pub async fn locate(&self, query: &str, view: &mut MapView) -> GeocodeOutcome {
        let query = query.trim();
        if query.is_empty() {
            return GeocodeOutcome::NoLocation;
        }

        let results = match self.search(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Geocoding error: {}", e);
                return GeocodeOutcome::SearchError(e.to_string());
            }
        };
        let Some(top) = results.first() else {
            return GeocodeOutcome::NoLocation;
        };
        let Some(position) = top.position() else {
            return GeocodeOutcome::InvalidCoordinates;
        };

        let label = format_label(top);
        let zoom = pick_zoom(top);
        view.set_view(position, zoom);
        view.show_temporary_marker(position, &label, Utc::now());
        info!("Centered on {} ({}, {}) zoom {}", label, position.lat, position.lon, zoom);
        GeocodeOutcome::Centered { label, position, zoom }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubHttp {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl StubHttp {
        fn new(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClientPort for StubHttp {
        async fn get(&self, _url: &str, query: &[(&str, &str)]) -> Result<HttpGetResult> {
            let mut seen = self.seen.lock().unwrap();
            seen.extend(query.iter().map(|(k, v)| (k.to_string(), v.to_string())));
            Ok(HttpGetResult {
                status: self.status,
                bytes: self.body.as_bytes().to_vec(),
                content_type: "application/json".to_string(),
            })
        }
    }

    fn geocoder(http: Arc<StubHttp>) -> Geocoder {
        Geocoder::new(http, GeocoderConfig::default())
    }

    fn place(class: &str, kind: &str) -> GeocodeMatch {
        GeocodeMatch {
            class: Some(class.to_string()),
            kind: Some(kind.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn zoom_depends_on_result_type() {
        assert_eq!(pick_zoom(&place("place", "city")), 11);
        assert_eq!(pick_zoom(&place("place", "village")), 11);
        assert_eq!(pick_zoom(&place("boundary", "city")), 14);
        assert_eq!(pick_zoom(&place("place", "postcode")), 10);
        assert_eq!(pick_zoom(&place("building", "house")), 14);
    }

    #[test]
    fn label_keeps_three_parts() {
        let item = GeocodeMatch {
            display_name: Some("Gary, Lake County, Indiana, 46402, United States".to_string()),
            ..Default::default()
        };
        assert_eq!(format_label(&item), "Gary, Lake County, Indiana");
        assert_eq!(format_label(&GeocodeMatch::default()), "Selected location");
    }

    #[tokio::test]
    async fn top_match_centers_the_map() {
        let http = StubHttp::new(
            200,
            r#"[{"lat": "41.5934", "lon": "-87.3464", "display_name": "Gary, Lake County, Indiana, United States",
                 "class": "place", "type": "city"}]"#,
        );
        let mut view = MapView::new();
        let outcome = geocoder(http.clone()).locate("Gary, IN", &mut view).await;

        let position = LatLng { lat: 41.5934, lon: -87.3464 };
        assert_eq!(
            outcome,
            GeocodeOutcome::Centered {
                label: "Gary, Lake County, Indiana".to_string(),
                position,
                zoom: 11
            }
        );
        assert_eq!(view.center(), position);
        assert_eq!(view.zoom(), 11);
        assert!(view.temporary_marker().is_some());

        let seen = http.seen.lock().unwrap();
        assert!(seen.contains(&("q".to_string(), "Gary, IN".to_string())));
        assert!(seen.contains(&("format".to_string(), "json".to_string())));
        assert!(seen.contains(&("limit".to_string(), "1".to_string())));
    }

    #[tokio::test]
    async fn empty_results_and_bad_coordinates() {
        let mut view = MapView::new();
        assert_eq!(
            geocoder(StubHttp::new(200, "[]")).locate("nowhere", &mut view).await,
            GeocodeOutcome::NoLocation
        );
        assert_eq!(
            geocoder(StubHttp::new(200, r#"[{"lat": "abc", "lon": null}]"#))
                .locate("somewhere", &mut view)
                .await,
            GeocodeOutcome::InvalidCoordinates
        );
        assert_eq!(view.zoom(), 4);
        assert!(view.temporary_marker().is_none());
    }

    #[tokio::test]
    async fn failed_request_is_a_search_error() {
        let mut view = MapView::new();
        let outcome = geocoder(StubHttp::new(503, "")).locate("Gary", &mut view).await;
        assert!(matches!(outcome, GeocodeOutcome::SearchError(_)));
        assert_eq!(outcome.to_string(), "Search error, try refining your query");
    }
}
