//! Dataset and path constants shared by the converters, the snapshot loader and the CLI.

// Converter names (used in CLI and registry)
pub const TRI_CONVERTER: &str = "tri";
pub const SUPERFUND_CONVERTER: &str = "superfund";
pub const VIOLATIONS_CONVERTER: &str = "violations";
pub const CSV_TO_JSON_CONVERTER: &str = "csv-to-json";

// Default output files under the data directory
pub const TRI_OUTPUT: &str = "tri.json";
pub const SUPERFUND_OUTPUT: &str = "superfund.json";
pub const VIOLATIONS_OUTPUT: &str = "violations.json";
pub const CSV_JSON_OUTPUT: &str = "tri_raw.json";
pub const NPL_RAW_OUTPUT: &str = "npl.raw.json";
pub const MARKERS_OUTPUT: &str = "markers.geojson";

// Prometheus text rendered at the end of each run, next to the run log
pub const METRICS_FILE: &str = "metrics.prom";

// Endpoints the page fetches
pub const TRI_2023_ENDPOINT: &str = "/data/tri-2023.json";
pub const VIOLATIONS_ENDPOINT: &str = "/data/violations.json";
pub const SUPERFUND_ENDPOINT: &str = "/data/superfund.json";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LOGS_DIR: &str = "logs";
pub const DEFAULT_CONFIG_FILE: &str = "pollution.toml";
pub const CONFIG_ENV: &str = "PNM_CONFIG";
pub const DATA_DIR_ENV: &str = "PNM_DATA_DIR";

pub const DEFAULT_TRI_YEAR: i32 = 2023;

pub const DATA_UNAVAILABLE: &str = "data unavailable";

pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const NPL_FEATURE_SERVICE_URL: &str = "https://services.arcgis.com/cJ9YHowT8TU7DUyn/arcgis/rest/services/Superfund_National_Priorities_List_(NPL)_Sites_with_Status_Information/FeatureServer/0/query";
pub const NPL_SOURCE_NOTE: &str = "EPA ArcGIS NPL Sites with Status Information (Status='NPL Site' with Listing_Date, excluding Deletion markers)";

/// Get all registered converter names
pub fn get_supported_converters() -> Vec<&'static str> {
    vec![
        TRI_CONVERTER,
        SUPERFUND_CONVERTER,
        VIOLATIONS_CONVERTER,
        CSV_TO_JSON_CONVERTER,
    ]
}
