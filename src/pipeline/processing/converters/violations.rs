use super::{Conversion, ConvertContext, Converter};
use crate::constants::{VIOLATIONS_CONVERTER, VIOLATIONS_OUTPUT};
use crate::error::Result;
use crate::pipeline::processing::geo::coordinates;
use crate::pipeline::processing::normalize::fields::{
    CITY, COMPLIANCE_PROGRAMS, ECHO_COUNT, ECHO_FACILITY, ECHO_PENALTY, STATE,
};
use crate::pipeline::processing::normalize::{normalize, NormalizedRecord};
use crate::types::{RawRecord, ViolationRecord};

pub const GENERAL_VIOLATION: &str = "General violation";

/// ECHO exporter facilities to `violations.json`; facilities without enforcement are skipped
pub struct ViolationsConverter;

impl ViolationsConverter {
    pub fn violation_record(record: &NormalizedRecord) -> Option<ViolationRecord> {
        let penalty = whole(record.number_or_zero(&ECHO_PENALTY));
        let count = whole(record.number_or_zero(&ECHO_COUNT));
        if penalty == 0 && count == 0 {
            return None;
        }

        let coords = coordinates(record);
        Some(ViolationRecord {
            facility: record.text(&ECHO_FACILITY),
            city: record.text(&CITY),
            state: record.text(&STATE),
            lat: coords.map(|c| c.lat),
            lon: coords.map(|c| c.lon),
            violation_type: violation_type(record).to_string(),
            count,
            penalty,
        })
    }
}

/// Label of the first program whose compliance status reports a violation.
/// ECHO writes clean facilities as "No Violation Identified".
pub fn violation_type(record: &NormalizedRecord) -> &'static str {
    COMPLIANCE_PROGRAMS
        .iter()
        .find(|(key, _)| record.get(key).is_some_and(reports_violation))
        .map(|(_, label)| *label)
        .unwrap_or(GENERAL_VIOLATION)
}

fn reports_violation(status: &str) -> bool {
    status.contains("Violation") && !status.starts_with("No ")
}

fn whole(value: f64) -> i64 {
    value.trunc() as i64
}

impl Converter for ViolationsConverter {
    fn name(&self) -> &'static str {
        VIOLATIONS_CONVERTER
    }

    fn default_output(&self) -> &'static str {
        VIOLATIONS_OUTPUT
    }

    fn convert(&self, records: &[RawRecord], _ctx: &ConvertContext) -> Result<Conversion> {
        let violations: Vec<ViolationRecord> = records
            .iter()
            .filter_map(|raw| Self::violation_record(&normalize(raw)))
            .collect();

        Ok(Conversion {
            records_written: violations.len(),
            records_dropped: records.len() - violations.len(),
            anomalies: Vec::new(),
            document: serde_json::to_value(&violations)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> NormalizedRecord {
        normalize(value.as_object().unwrap())
    }

    #[test]
    fn facilities_without_enforcement_are_skipped() {
        let r = record(json!({"FAC_NAME": "Clean", "FAC_TOTAL_PENALTIES": "0", "FAC_PENALTY_COUNT": ""}));
        assert_eq!(ViolationsConverter::violation_record(&r), None);
    }

    #[test]
    fn first_violating_program_names_the_type() {
        let r = record(json!({
            "FAC_NAME": " Refinery ", "FAC_STATE": "TX",
            "FAC_TOTAL_PENALTIES": "50000.7", "FAC_PENALTY_COUNT": "3",
            "CAA_COMPLIANCE_STATUS": "No Violation Identified",
            "CWA_COMPLIANCE_STATUS": "Violation Identified",
            "FAC_LAT": "29.7", "FAC_LONG": "-95.2"
        }));
        let v = ViolationsConverter::violation_record(&r).unwrap();
        assert_eq!(v.facility, "Refinery");
        assert_eq!(v.penalty, 50000);
        assert_eq!(v.count, 3);
        assert_eq!(v.violation_type, "Clean Water Act violation");
        assert_eq!(v.lat, Some(29.7));
    }

    #[test]
    fn missing_statuses_give_general_violation_and_null_coordinates() {
        let r = record(json!({"FAC_NAME": "Yard", "FAC_PENALTY_COUNT": "1", "FAC_LAT": "NaN"}));
        let v = ViolationsConverter::violation_record(&r).unwrap();
        assert_eq!(v.violation_type, GENERAL_VIOLATION);
        assert_eq!(v.lat, None);
        assert_eq!(v.lon, None);
    }
}
