//! Snapshot tiles: the page's summary statistics, computed from the published datasets.
//!
//! Every dataset goes through the same steps: load it from a [`DatasetSource`], check its shape
//! against the dataset schema, then render the tile text. The per-dataset differences live in a
//! [`DatasetConfig`]. Loads run concurrently and independently; a failed load only replaces its
//! own tile with [`DATA_UNAVAILABLE`].

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::constants::{
    DATA_UNAVAILABLE, SUPERFUND_ENDPOINT, TRI_2023_ENDPOINT, VIOLATIONS_ENDPOINT,
};
use crate::error::{ConvertError, Result};
use crate::pipeline::processing::geo::{geolocated, value_number};

pub mod format;
pub mod schema;
pub mod sources;

pub use schema::DatasetSchema;
pub use sources::{DatasetSource, DirSource, HttpSource};

/// Per-dataset wiring of the load → validate → render pipeline
#[derive(Clone, Copy)]
pub struct DatasetConfig {
    pub name: &'static str,
    pub endpoint: &'static str,
    /// CSS selector of the tile value on the page
    pub selector: &'static str,
    pub schema: DatasetSchema,
    pub render: fn(&Value) -> Result<String>,
}

/// The three tiles shown on the page, in display order
pub fn datasets() -> Vec<DatasetConfig> {
    vec![
        DatasetConfig {
            name: "tri",
            endpoint: TRI_2023_ENDPOINT,
            selector: "#snapshot-releases .snapshot-value",
            schema: DatasetSchema::Tri,
            render: render_tri,
        },
        DatasetConfig {
            name: "violations",
            endpoint: VIOLATIONS_ENDPOINT,
            selector: "#snapshot-violations .snapshot-value",
            schema: DatasetSchema::Violations,
            render: render_violations,
        },
        DatasetConfig {
            name: "superfund",
            endpoint: SUPERFUND_ENDPOINT,
            selector: "#snapshot-superfund .snapshot-value",
            schema: DatasetSchema::Superfund,
            render: render_superfund,
        },
    ]
}

/// One rendered tile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub dataset: String,
    pub selector: String,
    pub text: String,
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TriSummary {
    /// Geolocated records only
    pub facility_count: usize,
    pub total_release_lbs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViolationSummary {
    pub total_violations: f64,
    pub total_penalty: f64,
}

/// TRI totals over geolocated records; negative or unreadable releases count as zero.
pub fn summarize_tri(items: &[Value]) -> TriSummary {
    let valid: Vec<&Value> = items.iter().filter(|item| geolocated(item).is_some()).collect();
    let total_release_lbs = valid
        .iter()
        .map(|item| release_of(item).max(0.0))
        .sum();
    TriSummary {
        facility_count: valid.len(),
        total_release_lbs,
    }
}

/// `release_lbs`, then `release`, else 0
pub fn release_of(item: &Value) -> f64 {
    ["release_lbs", "release"]
        .iter()
        .filter_map(|key| item.get(key))
        .find(|value| !value.is_null())
        .and_then(value_number)
        .unwrap_or(0.0)
}

pub fn summarize_violations(items: &[Value]) -> ViolationSummary {
    let field_total = |key: &str| -> f64 {
        items
            .iter()
            .filter_map(|item| item.get(key).and_then(value_number))
            .sum()
    };
    ViolationSummary {
        total_violations: field_total("count"),
        total_penalty: field_total("penalty"),
    }
}

fn as_array<'a>(dataset: &str, payload: &'a Value) -> Result<&'a Vec<Value>> {
    payload.as_array().ok_or_else(|| ConvertError::Schema {
        dataset: dataset.to_string(),
        message: "payload is not an array".to_string(),
    })
}

pub fn render_tri(payload: &Value) -> Result<String> {
    let summary = summarize_tri(as_array("tri", payload)?);
    Ok(format!(
        "{} facilities, {} billion lbs reported",
        summary.facility_count,
        format::billions(summary.total_release_lbs)
    ))
}

pub fn render_violations(payload: &Value) -> Result<String> {
    let summary = summarize_violations(as_array("violations", payload)?);
    Ok(format!(
        "{} violations, ${}",
        format::thousands(summary.total_violations),
        format::thousands(summary.total_penalty)
    ))
}

pub fn render_superfund(payload: &Value) -> Result<String> {
    let count = payload
        .get("national_count")
        .and_then(Value::as_f64)
        .ok_or_else(|| ConvertError::Schema {
            dataset: "superfund".to_string(),
            message: "national_count is not a number".to_string(),
        })?;
    Ok(format::thousands(count))
}

/// Load, validate and render one tile. Errors become the unavailable placeholder.
pub async fn load_tile(source: &dyn DatasetSource, config: &DatasetConfig) -> Tile {
    let rendered = async {
        let payload = source.fetch(config.endpoint).await?;
        config.schema.validate(&payload)?;
        (config.render)(&payload)
    }
    .await;

    let (text, available) = match rendered {
        Ok(text) => (text, true),
        Err(e) => {
            warn!("{} snapshot fetch failed: {}", config.name, e);
            (DATA_UNAVAILABLE.to_string(), false)
        }
    };
    Tile {
        dataset: config.name.to_string(),
        selector: config.selector.to_string(),
        text,
        available,
    }
}

/// Load every configured tile concurrently. Tiles come back in the order of `configs`.
pub async fn load_snapshots(source: Arc<dyn DatasetSource>, configs: &[DatasetConfig]) -> Vec<Tile> {
    info!("Loading {} snapshots from {}", configs.len(), source.describe());
    let handles: Vec<_> = configs
        .iter()
        .copied()
        .map(|config| {
            let source = Arc::clone(&source);
            tokio::spawn(async move { load_tile(source.as_ref(), &config).await })
        })
        .collect();

    let mut tiles = Vec::with_capacity(configs.len());
    for (handle, config) in handles.into_iter().zip(configs) {
        let tile = match handle.await {
            Ok(tile) => tile,
            Err(e) => {
                warn!("{} snapshot task failed: {}", config.name, e);
                Tile {
                    dataset: config.name.to_string(),
                    selector: config.selector.to_string(),
                    text: DATA_UNAVAILABLE.to_string(),
                    available: false,
                }
            }
        };
        tiles.push(tile);
    }
    tiles
}
