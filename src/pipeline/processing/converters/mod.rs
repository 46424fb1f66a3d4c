use chrono::{Local, NaiveDate};
use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::processing::release::ReleasePolicy;
use crate::types::RawRecord;

pub mod csv_json;
pub mod registry;
pub mod superfund;
pub mod tri;
pub mod violations;

pub use csv_json::CsvToJsonConverter;
pub use registry::ConverterRegistry;
pub use superfund::SuperfundConverter;
pub use tri::TriConverter;
pub use violations::ViolationsConverter;

/// Run-wide settings shared by all converters
#[derive(Debug, Clone)]
pub struct ConvertContext {
    /// Year used for TRI rows that do not report one
    pub default_year: i32,
    pub release_policy: ReleasePolicy,
    /// Keep only current final NPL sites (drops proposed and deleted sites)
    pub final_npl_only: bool,
    /// Expected (min, max) site count; a count outside is reported as an anomaly
    pub site_count_band: Option<(usize, usize)>,
    /// Date stamped into snapshot documents
    pub as_of: NaiveDate,
}

impl Default for ConvertContext {
    fn default() -> Self {
        Self {
            default_year: crate::constants::DEFAULT_TRI_YEAR,
            release_policy: ReleasePolicy::default(),
            final_npl_only: false,
            site_count_band: None,
            as_of: Local::now().date_naive(),
        }
    }
}

impl ConvertContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_year: config.tri.default_year,
            release_policy: ReleasePolicy {
                include_off_site: config.tri.include_off_site,
            },
            ..Self::default()
        }
    }

    /// Enable the final-NPL filter together with the configured sanity band.
    pub fn with_final_npl(mut self, config: &Config) -> Self {
        self.final_npl_only = true;
        self.site_count_band = Some((config.npl.min_sites, config.npl.max_sites));
        self
    }
}

/// Output of one converter run, ready for the emitter
#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: Value,
    pub records_written: usize,
    pub records_dropped: usize,
    /// Problems worth a human look that did not stop the run
    pub anomalies: Vec<String>,
}

/// Turns the raw records of one export into the simplified document the page consumes
pub trait Converter: Send + Sync {
    /// Name used on the command line and in the registry
    fn name(&self) -> &'static str;

    /// Output file name under the data directory when none is given
    fn default_output(&self) -> &'static str;

    fn convert(&self, records: &[RawRecord], ctx: &ConvertContext) -> Result<Conversion>;
}
