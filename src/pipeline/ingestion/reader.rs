use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::error::{ConvertError, Result};
use crate::types::RawRecord;

/// How the source file is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Pick a format from the file extension, sniffing the content when the extension says nothing.
    pub fn detect(path: &Path, text: &str) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") | Some("txt") => SourceFormat::Csv,
            Some("json") | Some("geojson") => SourceFormat::Json,
            _ => match strip_bom(text).trim_start().chars().next() {
                Some('[') | Some('{') => SourceFormat::Json,
                _ => SourceFormat::Csv,
            },
        }
    }
}

/// Records read from one input file, plus what the run log needs to identify it
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub records: Vec<RawRecord>,
    pub sha256: String,
    pub byte_len: usize,
}

/// Read and parse one input file. Any read or parse failure is fatal for the run.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_records(path: &Path) -> Result<RawBatch> {
    let bytes = fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    let sha256 = hex::encode(Sha256::digest(&bytes));
    let byte_len = bytes.len();

    let text = decode_text(bytes);
    let format = SourceFormat::detect(path, &text);
    debug!("Detected {:?} source ({} bytes)", format, byte_len);

    let records = parse_text(path, format, &text)?;
    info!("Read {} raw records from {}", records.len(), path.display());

    Ok(RawBatch {
        path: path.to_path_buf(),
        format,
        records,
        sha256,
        byte_len,
    })
}

/// Parse already-loaded text. `path` is only used for error reporting.
pub fn parse_text(path: &Path, format: SourceFormat, text: &str) -> Result<Vec<RawRecord>> {
    match format {
        SourceFormat::Csv => parse_csv(path, strip_bom(text)),
        SourceFormat::Json => parse_json(path, text),
    }
}

/// EPA text exports are occasionally Latin-1; fall back to a byte-per-char decode for those.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("Input is not valid UTF-8, decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Drop a BOM and anything before the first `[` or `{`.
pub fn trim_to_json(text: &str) -> Option<&str> {
    json_starts(text).next()
}

/// Every suffix of `text` (BOM removed) that begins with `[` or `{`, in order.
fn json_starts(text: &str) -> impl Iterator<Item = &str> {
    let text = strip_bom(text);
    text.match_indices(['[', '{']).map(move |(idx, _)| &text[idx..])
}

fn parse_json(path: &Path, text: &str) -> Result<Vec<RawRecord>> {
    let body_len = strip_bom(text).len();
    let mut first_error = None;

    // A preamble such as `Warning {deprecated}` can itself contain brackets,
    // so try each later start until one parses as a whole document.
    for candidate in json_starts(text) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => {
                if candidate.len() != body_len {
                    debug!(
                        "Skipped {} leading characters before JSON content",
                        body_len - candidate.len()
                    );
                }
                return records_from_value(value).ok_or_else(|| {
                    ConvertError::parse(path, "expected a JSON array or object of records")
                });
            }
            Err(e) => {
                let truncated = e.is_eof();
                first_error.get_or_insert_with(|| e.to_string());
                // A document that runs out mid-value is broken, not preceded by noise
                if truncated {
                    break;
                }
            }
        }
    }

    Err(ConvertError::parse(
        path,
        first_error.unwrap_or_else(|| "no JSON array or object found".to_string()),
    ))
}

fn records_from_value(value: Value) -> Option<Vec<RawRecord>> {
    match value {
        Value::Array(items) => Some(records_from_items(items)),
        Value::Object(mut obj) => {
            if let Some(Value::Array(features)) = obj.remove("features") {
                return Some(features.into_iter().filter_map(record_from_feature).collect());
            }
            for key in ["sites", "records", "data"] {
                if let Some(Value::Array(items)) = obj.remove(key) {
                    return Some(records_from_items(items));
                }
            }
            let mut record = RawRecord::new();
            flatten_into(&mut record, "", Value::Object(obj));
            Some(vec![record])
        }
        _ => None,
    }
}

fn records_from_items(items: Vec<Value>) -> Vec<RawRecord> {
    let total = items.len();
    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(_) => {
                let mut record = RawRecord::new();
                flatten_into(&mut record, "", item);
                Some(record)
            }
            _ => None,
        })
        .collect();
    if records.len() != total {
        warn!("Ignored {} non-object array entries", total - records.len());
    }
    records
}

/// GeoJSON features keep their fields under `properties`, ArcGIS feature sets under `attributes`.
/// Either is lifted to the top level; geometry is flattened under `geometry.`.
fn record_from_feature(feature: Value) -> Option<RawRecord> {
    let Value::Object(mut feature) = feature else {
        return None;
    };
    let mut record = RawRecord::new();

    let fields = feature
        .remove("properties")
        .filter(|v| v.is_object())
        .or_else(|| feature.remove("attributes").filter(|v| v.is_object()));
    let geometry = feature.remove("geometry");

    match fields {
        Some(fields) => flatten_into(&mut record, "", fields),
        None => flatten_into(&mut record, "", Value::Object(feature)),
    }
    if let Some(geometry) = geometry.filter(|g| !g.is_null()) {
        flatten_into(&mut record, "geometry", geometry);
    }
    Some(record)
}

/// Flatten nested objects into dotted keys. Arrays are indexed (`coordinates.0`); arrays of
/// strings are additionally joined with `;` under their own key.
pub fn flatten_into(out: &mut RawRecord, prefix: &str, value: Value) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(out, &join(&key), child);
            }
        }
        Value::Array(items) if !prefix.is_empty() => {
            if !items.is_empty() && items.iter().all(Value::is_string) {
                let joined: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                out.insert(prefix.to_string(), Value::String(joined.join(";")));
            }
            for (idx, child) in items.into_iter().enumerate() {
                flatten_into(out, &join(&idx.to_string()), child);
            }
        }
        Value::Array(_) => {}
        scalar => {
            out.insert(prefix.to_string(), scalar);
        }
    }
}

fn parse_csv(path: &Path, text: &str) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ConvertError::parse(path, format!("failed to read CSV headers: {e}")))?
        .clone();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line, and CSV lines are 1-based
        let line = idx + 2;
        let row = result.map_err(|e| ConvertError::parse(path, format!("line {line}: {e}")))?;

        let mut record = RawRecord::new();
        for (header, field) in headers.iter().zip(row.iter()) {
            record.insert(header.to_string(), Value::String(field.to_string()));
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_records(text: &str) -> Vec<RawRecord> {
        parse_text(Path::new("in.json"), SourceFormat::Json, text).unwrap()
    }

    #[test]
    fn bom_and_leading_garbage_are_skipped() {
        let records = json_records("\u{feff}garbage\n[{\"chemical\": \"Lead\"}]");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["chemical"], json!("Lead"));
    }

    #[test]
    fn bracketed_preamble_is_skipped() {
        let records = json_records("Warning {deprecated}\n[{\"chemical\": \"Lead\"}]");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["chemical"], json!("Lead"));
    }

    #[test]
    fn truncated_array_does_not_fall_back_to_an_inner_object() {
        let err = parse_text(
            Path::new("in.json"),
            SourceFormat::Json,
            "[{\"chemical\": \"Lead\"}, {\"chemical\": \"Zinc\"}",
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::Parse { .. }));
    }

    #[test]
    fn invalid_json_reports_path_and_parser_message() {
        let err = parse_text(Path::new("data/tri_raw.json"), SourceFormat::Json, "[{\"a\": ")
            .unwrap_err();
        match err {
            ConvertError::Parse { path, message } => {
                assert_eq!(path, PathBuf::from("data/tri_raw.json"));
                assert!(message.contains("EOF"), "unexpected message: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn text_without_json_is_a_parse_error() {
        let err = parse_text(Path::new("x.json"), SourceFormat::Json, "not json at all").unwrap_err();
        assert!(matches!(err, ConvertError::Parse { .. }));
    }

    #[test]
    fn geojson_features_lift_properties_and_flatten_geometry() {
        let records = json_records(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [-77.0, 38.9]},
                 "properties": {"SITE_NAME": "Test Site"}}
            ]}"#,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["SITE_NAME"], json!("Test Site"));
        assert_eq!(records[0]["geometry.coordinates.0"], json!(-77.0));
        assert_eq!(records[0]["geometry.coordinates.1"], json!(38.9));
        assert_eq!(records[0]["geometry.type"], json!("Point"));
    }

    #[test]
    fn arcgis_attributes_are_lifted() {
        let records = json_records(
            r#"{"features": [{"attributes": {"Site_Name": "Mill"}, "geometry": {"x": -90.1, "y": 35.2}}]}"#,
        );
        assert_eq!(records[0]["Site_Name"], json!("Mill"));
        assert_eq!(records[0]["geometry.x"], json!(-90.1));
        assert_eq!(records[0]["geometry.y"], json!(35.2));
    }

    #[test]
    fn string_arrays_are_joined_and_indexed() {
        let records = json_records(r#"[{"contaminants": ["Lead", "TCE"]}]"#);
        assert_eq!(records[0]["contaminants"], json!("Lead;TCE"));
        assert_eq!(records[0]["contaminants.1"], json!("TCE"));
    }

    #[test]
    fn csv_rows_keep_headers_as_keys() {
        let records = parse_text(
            Path::new("in.csv"),
            SourceFormat::Csv,
            "\u{feff}FACILITY NAME, CHEMICAL\n Acme Co ,Lead\nBeta Inc,Mercury\n",
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["FACILITY NAME"], json!("Acme Co"));
        assert_eq!(records[1]["CHEMICAL"], json!("Mercury"));
    }

    #[test]
    fn format_detection_prefers_extension_then_content() {
        assert_eq!(SourceFormat::detect(Path::new("a.csv"), "[1]"), SourceFormat::Csv);
        assert_eq!(SourceFormat::detect(Path::new("a.geojson"), "x"), SourceFormat::Json);
        assert_eq!(SourceFormat::detect(Path::new("export"), "\u{feff} [ ]"), SourceFormat::Json);
        assert_eq!(SourceFormat::detect(Path::new("export"), "A,B\n1,2"), SourceFormat::Csv);
    }
}
