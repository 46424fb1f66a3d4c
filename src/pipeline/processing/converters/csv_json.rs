use serde_json::Value;

use super::{Conversion, ConvertContext, Converter};
use crate::constants::{CSV_JSON_OUTPUT, CSV_TO_JSON_CONVERTER};
use crate::error::Result;
use crate::types::RawRecord;

/// Plain CSV to JSON array conversion; headers and values are kept as read
pub struct CsvToJsonConverter;

impl Converter for CsvToJsonConverter {
    fn name(&self) -> &'static str {
        CSV_TO_JSON_CONVERTER
    }

    fn default_output(&self) -> &'static str {
        CSV_JSON_OUTPUT
    }

    fn convert(&self, records: &[RawRecord], _ctx: &ConvertContext) -> Result<Conversion> {
        let rows: Vec<Value> = records.iter().cloned().map(Value::Object).collect();
        Ok(Conversion {
            records_written: rows.len(),
            records_dropped: 0,
            anomalies: Vec::new(),
            document: Value::Array(rows),
        })
    }
}
