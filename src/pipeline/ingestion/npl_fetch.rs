use serde_json::Value;
use std::path::Path;
use tracing::{info, instrument};

use crate::app::ports::HttpClientPort;
use crate::config::NplConfig;
use crate::error::{ConvertError, Result};
use crate::pipeline::output::write_json;

/// Query for every feature of the layer, geometry included, in WGS84
pub const NPL_QUERY: &[(&str, &str)] = &[
    ("where", "1=1"),
    ("outFields", "*"),
    ("returnGeometry", "true"),
    ("f", "json"),
    ("outSR", "4326"),
];

/// Download the NPL feature layer and save it unmodified. Returns the number of features.
#[instrument(skip(http, config))]
pub async fn fetch_npl(http: &dyn HttpClientPort, config: &NplConfig, output: &Path) -> Result<usize> {
    let resp = http.get(&config.feature_service_url, NPL_QUERY).await?;
    if !resp.is_success() {
        return Err(ConvertError::Api {
            message: format!("NPL feature service responded with status {}", resp.status),
        });
    }
    let layer = resp.json(&config.feature_service_url)?;
    // ArcGIS reports query failures as a 200 with an `error` object
    if let Some(error) = layer.get("error") {
        return Err(ConvertError::Api {
            message: format!("NPL feature service error: {error}"),
        });
    }

    write_json(output, &layer)?;
    let features = layer
        .get("features")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    info!("Saved raw NPL feature layer to {} with {} features", output.display(), features);
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use async_trait::async_trait;

    struct FixedResponse(u16, &'static str);

    #[async_trait]
    impl HttpClientPort for FixedResponse {
        async fn get(&self, _url: &str, query: &[(&str, &str)]) -> Result<HttpGetResult> {
            assert!(query.contains(&("outSR", "4326")));
            Ok(HttpGetResult {
                status: self.0,
                bytes: self.1.as_bytes().to_vec(),
                content_type: "application/json".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn layer_is_saved_as_received() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("data").join("npl.raw.json");
        let http = FixedResponse(200, r#"{"features": [{"attributes": {"Site_Name": "A"}}, {"attributes": {}}]}"#);

        let count = fetch_npl(&http, &NplConfig::default(), &output).await.unwrap();
        assert_eq!(count, 2);
        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(saved["features"][0]["attributes"]["Site_Name"], "A");
    }

    #[tokio::test]
    async fn service_errors_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("npl.raw.json");

        let http = FixedResponse(200, r#"{"error": {"code": 400, "message": "Invalid query"}}"#);
        assert!(fetch_npl(&http, &NplConfig::default(), &output).await.is_err());
        let http = FixedResponse(500, "");
        assert!(fetch_npl(&http, &NplConfig::default(), &output).await.is_err());
        assert!(!output.exists());
    }
}
