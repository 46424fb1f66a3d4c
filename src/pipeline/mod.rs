// Conversion pipeline: ingestion, processing, and output

pub mod ingestion;
pub mod output;
pub mod processing;

use ::metrics::{counter, histogram};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::error::Result;
use ingestion::{read_records, SourceFormat};
use processing::converters::{ConvertContext, Converter};

/// Result of one conversion run
#[derive(Debug, Serialize)]
pub struct ConversionResult {
    pub converter: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub input_sha256: String,
    pub input_format: SourceFormat,
    pub input_bytes: usize,
    pub records_read: usize,
    pub records_written: usize,
    pub records_dropped: usize,
    pub anomalies: Vec<String>,
    pub anomaly_log: Option<PathBuf>,
}

pub struct Pipeline;

impl Pipeline {
    /// Read `input`, convert it, and write the document to `output`.
    ///
    /// A read or parse failure returns before anything is written. Anomalies are logged and, when
    /// `anomaly_log` is set and there are any, written there as well.
    #[instrument(skip(converter, ctx), fields(converter = %converter.name()))]
    pub fn run(
        converter: &dyn Converter,
        input: &Path,
        output: &Path,
        ctx: &ConvertContext,
        anomaly_log: Option<&Path>,
    ) -> Result<ConversionResult> {
        let name = converter.name().to_string();
        counter!("pnm_conversion_runs_total", "converter" => name.clone()).increment(1);
        let t_run = std::time::Instant::now();

        info!("Reading {}", input.display());
        let batch = read_records(input)?;
        info!(
            "Parsed {} bytes of {:?} from {}",
            batch.byte_len,
            batch.format,
            batch.path.display()
        );
        counter!("pnm_records_read_total", "converter" => name.clone())
            .increment(batch.records.len() as u64);

        let conversion = converter.convert(&batch.records, ctx)?;
        counter!("pnm_records_written_total", "converter" => name.clone())
            .increment(conversion.records_written as u64);
        counter!("pnm_records_dropped_total", "converter" => name.clone())
            .increment(conversion.records_dropped as u64);

        output::write_json(output, &conversion.document)?;
        info!(
            "Wrote {} records to {} ({} dropped, input sha256 {})",
            conversion.records_written,
            output.display(),
            conversion.records_dropped,
            batch.sha256
        );

        for anomaly in &conversion.anomalies {
            warn!("{}", anomaly);
        }
        let anomaly_log = match anomaly_log {
            Some(path) if !conversion.anomalies.is_empty() => {
                output::write_anomalies(path, &conversion.anomalies, batch.records.len())?;
                warn!("Ingest anomalies logged to {}", path.display());
                Some(path.to_path_buf())
            }
            _ => None,
        };

        histogram!("pnm_conversion_duration_seconds", "converter" => name.clone())
            .record(t_run.elapsed().as_secs_f64());

        Ok(ConversionResult {
            converter: name,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            input_sha256: batch.sha256,
            input_format: batch.format,
            input_bytes: batch.byte_len,
            records_read: batch.records.len(),
            records_written: conversion.records_written,
            records_dropped: conversion.records_dropped,
            anomalies: conversion.anomalies,
            anomaly_log,
        })
    }
}
