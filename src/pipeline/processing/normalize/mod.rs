use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::RawRecord;

pub mod fields;

pub use fields::FieldCandidates;

static NUMERAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+\.\s+)+").expect("numeral prefix regex"));
static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-eE+]").expect("non-numeric regex"));

/// A raw record whose keys have been brought into canonical form.
///
/// Keys are uppercase, trimmed and free of leading `"<n>. "` numbering; values are trimmed strings.
/// Numeric parsing happens on demand through [`NormalizedRecord::number`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    fields: BTreeMap<String, String>,
}

/// Canonical form of a source column header.
pub fn canonical_key(key: &str) -> String {
    NUMERAL_PREFIX
        .replace(key.trim(), "")
        .trim()
        .to_uppercase()
}

/// Coerce a raw value to the trimmed string the rest of the pipeline works on.
pub fn coerce_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Lenient numeric parse: drops everything but digits, sign, decimal point and exponent
/// (so `"$1,200"` reads as 1200) and only returns finite values.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned = NON_NUMERIC.replace_all(text, "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Normalize one raw record. When two source headers share a canonical form the first
/// non-empty value is kept.
pub fn normalize(raw: &RawRecord) -> NormalizedRecord {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in raw {
        let canonical = canonical_key(key);
        let value = coerce_value(value);
        match fields.get_mut(&canonical) {
            Some(existing) => {
                debug!("Header '{}' collides with canonical key '{}'", key, canonical);
                if existing.is_empty() && !value.is_empty() {
                    *existing = value;
                }
            }
            None => {
                fields.insert(canonical, value);
            }
        }
    }
    NormalizedRecord { fields }
}

impl NormalizedRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// First present, non-empty value among the candidate headers.
    pub fn first(&self, candidates: &FieldCandidates) -> Option<&str> {
        candidates
            .names
            .iter()
            .filter_map(|name| self.get(name))
            .find(|value| !value.is_empty())
    }

    /// Like [`first`](Self::first) with a fallback.
    pub fn text_or(&self, candidates: &FieldCandidates, default: &str) -> String {
        self.first(candidates).unwrap_or(default).to_string()
    }

    pub fn text(&self, candidates: &FieldCandidates) -> String {
        self.text_or(candidates, "")
    }

    /// Numeric value of the first present candidate; `None` when absent or non-numeric.
    pub fn number(&self, candidates: &FieldCandidates) -> Option<f64> {
        self.first(candidates).and_then(parse_number)
    }

    pub fn number_or_zero(&self, candidates: &FieldCandidates) -> f64 {
        self.number(candidates).unwrap_or(0.0)
    }

    /// Back to a raw record, e.g. to feed a normalized record through normalization again.
    pub fn to_raw(&self) -> RawRecord {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn canonical_key_strips_numbering_whitespace_and_case() {
        assert_eq!(canonical_key("  4. facility name "), "FACILITY NAME");
        assert_eq!(canonical_key("47. 5.1 - FUGITIVE AIR"), "5.1 - FUGITIVE AIR");
        assert_eq!(canonical_key("1. 2. year"), "YEAR");
        assert_eq!(canonical_key("fugitive_tot_rel"), "FUGITIVE_TOT_REL");
        assert_eq!(canonical_key("geometry.coordinates.0"), "GEOMETRY.COORDINATES.0");
    }

    #[test]
    fn values_are_trimmed_strings() {
        let record = normalize(&raw(json!({
            " chemical ": "  Lead ",
            "year": 2023,
            "lat": null,
            "flag": true
        })));
        assert_eq!(record.get("CHEMICAL"), Some("Lead"));
        assert_eq!(record.get("YEAR"), Some("2023"));
        assert_eq!(record.get("LAT"), Some(""));
        assert_eq!(record.get("FLAG"), Some("true"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize(&raw(json!({
            "1. YEAR": " 2023",
            " 4. Facility Name": "Acme Co ",
            "47. 5.1 - FUGITIVE AIR": 12.5,
            "stack_tot_rel": ""
        })));
        let twice = normalize(&once.to_raw());
        assert_eq!(once, twice);
    }

    #[test]
    fn every_key_appears_once_under_its_canonical_form() {
        let record = normalize(&raw(json!({
            "chemical": "",
            " CHEMICAL": "Lead",
            "Chemical ": "Mercury"
        })));
        assert_eq!(record.len(), 1);
        assert!(record.contains("CHEMICAL"));
        assert_ne!(record.get("CHEMICAL"), Some(""));
    }

    #[test]
    fn parse_number_is_lenient_but_finite_only() {
        assert_eq!(parse_number("150"), Some(150.0));
        assert_eq!(parse_number("$1,200.50"), Some(1200.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("1e999"), None);
    }

    #[test]
    fn candidates_are_tried_in_priority_order() {
        const NAME: FieldCandidates = FieldCandidates {
            field: "facility",
            names: &["FACILITY NAME", "POTW_NAME_1"],
        };
        let record = normalize(&raw(json!({"potw_name_1": "Works", "facility name": " "})));
        assert_eq!(record.first(&NAME), Some("Works"));

        let record = normalize(&raw(json!({"potw_name_1": "Works", "facility name": "Plant"})));
        assert_eq!(record.first(&NAME), Some("Plant"));
        assert_eq!(normalize(&RawRecord::new()).text_or(&NAME, "Unknown"), "Unknown");
    }
}
