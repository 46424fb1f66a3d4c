use tracing::debug;

use super::{Conversion, ConvertContext, Converter};
use crate::constants::{TRI_CONVERTER, TRI_OUTPUT};
use crate::error::Result;
use crate::pipeline::processing::geo::coordinates;
use crate::pipeline::processing::normalize::fields::{CHEMICAL, FACILITY, YEAR};
use crate::pipeline::processing::normalize::normalize;
use crate::pipeline::processing::release::ReleaseSource;
use crate::types::{FacilityRecord, RawRecord};

pub const UNKNOWN_FACILITY: &str = "Unknown Facility";
pub const UNKNOWN_CHEMICAL: &str = "Unknown Chemical";

/// Raw TRI rows to `{facility, chemical, release_lbs, year}`
pub struct TriConverter;

impl TriConverter {
    pub fn facility_record(raw: &RawRecord, ctx: &ConvertContext) -> (FacilityRecord, ReleaseSource) {
        let record = normalize(raw);
        let release = ctx.release_policy.aggregate(&record);
        let year = record
            .number(&YEAR)
            .map(|y| y.trunc() as i32)
            .unwrap_or(ctx.default_year);
        let coords = coordinates(&record);

        let facility = FacilityRecord {
            facility: record.text_or(&FACILITY, UNKNOWN_FACILITY),
            chemical: record.text_or(&CHEMICAL, UNKNOWN_CHEMICAL),
            release_lbs: release.lbs,
            year,
            lat: coords.map(|c| c.lat),
            lon: coords.map(|c| c.lon),
        };
        (facility, release.source)
    }
}

impl Converter for TriConverter {
    fn name(&self) -> &'static str {
        TRI_CONVERTER
    }

    fn default_output(&self) -> &'static str {
        TRI_OUTPUT
    }

    fn convert(&self, records: &[RawRecord], ctx: &ConvertContext) -> Result<Conversion> {
        let mut reported_totals = 0usize;
        let facilities: Vec<FacilityRecord> = records
            .iter()
            .map(|raw| {
                let (facility, source) = Self::facility_record(raw, ctx);
                if source == ReleaseSource::ReportedTotal {
                    reported_totals += 1;
                }
                facility
            })
            .collect();

        debug!(
            "{} of {} TRI rows used a reported on-site total",
            reported_totals,
            facilities.len()
        );

        Ok(Conversion {
            records_written: facilities.len(),
            records_dropped: 0,
            anomalies: Vec::new(),
            document: serde_json::to_value(&facilities)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert(rows: serde_json::Value) -> Vec<FacilityRecord> {
        let records: Vec<RawRecord> = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect();
        let conversion = TriConverter.convert(&records, &ConvertContext::default()).unwrap();
        serde_json::from_value(conversion.document).unwrap()
    }

    #[test]
    fn legacy_snake_case_rows_fall_back_to_potw_name() {
        let out = convert(json!([{
            "potw_name_1": "City Works",
            "chemical": "Lead",
            "fugitive_tot_rel": "10",
            "stack_tot_rel": 5,
            "reporting_year": "2022"
        }]));
        assert_eq!(out[0].facility, "City Works");
        assert_eq!(out[0].release_lbs, 15.0);
        assert_eq!(out[0].year, 2022);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let out = convert(json!([{}]));
        assert_eq!(out[0].facility, UNKNOWN_FACILITY);
        assert_eq!(out[0].chemical, UNKNOWN_CHEMICAL);
        assert_eq!(out[0].release_lbs, 0.0);
        assert_eq!(out[0].year, 2023);
        assert_eq!(out[0].lat, None);
    }

    #[test]
    fn coordinates_are_carried_when_present() {
        let out = convert(json!([{"FACILITY NAME": "Acme", "LATITUDE": "29.7", "LONGITUDE": "-95.3"}]));
        assert_eq!(out[0].lat, Some(29.7));
        assert_eq!(out[0].lon, Some(-95.3));
    }
}
