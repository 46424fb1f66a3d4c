use serde::{Deserialize, Serialize, Serializer};

/// Raw record as read from a CSV row, JSON object or flattened GeoJSON feature
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// One entry of `tri.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub facility: String,
    pub chemical: String,
    #[serde(serialize_with = "serialize_quantity")]
    pub release_lbs: f64,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// One entry of `superfund.json` `sites`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub site_name: String,
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    pub npl_status: String,
    pub contaminants: Vec<String>,
    pub remedy: String,
    pub estimated_cleanup_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epa_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_completion_date: Option<String>,
}

/// The `superfund.json` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperfundSnapshot {
    pub national_count: usize,
    pub as_of: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub sites: Vec<SiteRecord>,
}

impl SuperfundSnapshot {
    pub fn new(as_of: String, source: Option<String>, sites: Vec<SiteRecord>) -> Self {
        Self {
            national_count: sites.len(),
            as_of,
            source,
            sites,
        }
    }
}

/// One entry of `violations.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub facility: String,
    pub city: String,
    pub state: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(rename = "type", alias = "violation")]
    pub violation_type: String,
    pub count: i64,
    pub penalty: i64,
}

/// Writes whole-number quantities as JSON integers (`150` rather than `150.0`).
pub fn serialize_quantity<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
