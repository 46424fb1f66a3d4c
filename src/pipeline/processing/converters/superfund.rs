use chrono::DateTime;
use tracing::{debug, warn};

use super::{Conversion, ConvertContext, Converter};
use crate::constants::{NPL_SOURCE_NOTE, SUPERFUND_CONVERTER, SUPERFUND_OUTPUT};
use crate::error::Result;
use crate::pipeline::processing::geo::coordinates;
use crate::pipeline::processing::normalize::fields::{
    CITY, CLEANUP_COST, CONSTRUCTION_COMPLETION_DATE, CONTAMINANTS, COUNTY, DELETION_DATE,
    DELETION_NOTICE, EPA_ID, LISTING_DATE, NPL_STATUS, PROPOSED_DATE, REGION, REMEDY, SEMS_ID,
    SITE_NAME, STATE,
};
use crate::pipeline::processing::normalize::{normalize, FieldCandidates, NormalizedRecord};
use crate::types::{RawRecord, SiteRecord, SuperfundSnapshot};

pub const DEFAULT_SITE_NAME: &str = "Superfund site";
pub const UNKNOWN_STATUS: &str = "Unknown";

const PROPOSED_STATUS: &str = "Proposed NPL Site";
const DELETED_STATUS: &str = "Deleted NPL Site";
const FINAL_STATUS: &str = "NPL Site";

/// Superfund exports (GeoJSON, ArcGIS feature sets, flat JSON or CSV) to `superfund.json`
pub struct SuperfundConverter;

/// Why a site was left out of the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteExclusion {
    NoCoordinates,
    Proposed,
    Deleted,
    NotCurrentlyListed,
    MissingRequiredField(&'static str),
}

impl SuperfundConverter {
    /// Build one site, or say why it is excluded
    pub fn site_record(
        record: &NormalizedRecord,
        ctx: &ConvertContext,
    ) -> std::result::Result<SiteRecord, SiteExclusion> {
        let status = record.text_or(&NPL_STATUS, UNKNOWN_STATUS);
        if ctx.final_npl_only {
            check_final_listing(record, &status)?;
        }

        let coords = coordinates(record).ok_or(SiteExclusion::NoCoordinates)?;

        let site_name = if ctx.final_npl_only {
            record
                .first(&SITE_NAME)
                .ok_or(SiteExclusion::MissingRequiredField("site_name"))?
                .to_string()
        } else {
            record.text_or(&SITE_NAME, DEFAULT_SITE_NAME)
        };
        let state = record.text(&STATE);
        if ctx.final_npl_only && state.is_empty() {
            return Err(SiteExclusion::MissingRequiredField("state"));
        }

        let contaminants = record
            .first(&CONTAMINANTS)
            .map(|list| {
                list.split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(SiteRecord {
            site_name,
            city: record.text(&CITY),
            state,
            lat: coords.lat,
            lon: coords.lon,
            npl_status: status,
            contaminants,
            remedy: record.text(&REMEDY),
            estimated_cleanup_cost: record.number(&CLEANUP_COST),
            epa_id: optional(record, &EPA_ID),
            site_id: optional(record, &SEMS_ID),
            region: optional(record, &REGION),
            county: optional(record, &COUNTY),
            proposed_date: optional_date(record, &PROPOSED_DATE),
            listing_date: optional_date(record, &LISTING_DATE),
            construction_completion_date: optional_date(record, &CONSTRUCTION_COMPLETION_DATE),
        })
    }
}

/// Current final NPL sites only: no proposed or deleted sites, and an `NPL Site` entry needs a
/// listing date and no deletion markers.
fn check_final_listing(
    record: &NormalizedRecord,
    status: &str,
) -> std::result::Result<(), SiteExclusion> {
    match status {
        PROPOSED_STATUS => Err(SiteExclusion::Proposed),
        DELETED_STATUS => Err(SiteExclusion::Deleted),
        FINAL_STATUS => {
            if record.first(&LISTING_DATE).is_none() {
                return Err(SiteExclusion::NotCurrentlyListed);
            }
            if record.first(&DELETION_DATE).is_some() || record.first(&DELETION_NOTICE).is_some() {
                return Err(SiteExclusion::Deleted);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn optional(record: &NormalizedRecord, candidates: &FieldCandidates) -> Option<String> {
    record.first(candidates).map(String::from)
}

/// ArcGIS feature layers report dates as epoch milliseconds; those become `YYYY-MM-DD`.
fn optional_date(record: &NormalizedRecord, candidates: &FieldCandidates) -> Option<String> {
    let value = record.first(candidates)?;
    let is_epoch_millis = value.len() >= 11 && value.trim_start_matches('-').bytes().all(|b| b.is_ascii_digit());
    if is_epoch_millis {
        if let Some(date) = value
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
        {
            return Some(date.date_naive().format("%Y-%m-%d").to_string());
        }
    }
    Some(value.to_string())
}

impl Converter for SuperfundConverter {
    fn name(&self) -> &'static str {
        SUPERFUND_CONVERTER
    }

    fn default_output(&self) -> &'static str {
        SUPERFUND_OUTPUT
    }

    fn convert(&self, records: &[RawRecord], ctx: &ConvertContext) -> Result<Conversion> {
        let mut sites = Vec::new();
        let mut anomalies = Vec::new();
        let mut dropped = 0usize;

        for (idx, raw) in records.iter().enumerate() {
            let record = normalize(raw);
            match Self::site_record(&record, ctx) {
                Ok(site) => sites.push(site),
                Err(SiteExclusion::MissingRequiredField(field)) => {
                    dropped += 1;
                    anomalies.push(format!(
                        "Record {}: missing required field {} (site_name={:?}, state={:?})",
                        idx,
                        field,
                        record.first(&SITE_NAME),
                        record.first(&STATE)
                    ));
                }
                Err(reason) => {
                    dropped += 1;
                    debug!("Excluding record {}: {:?}", idx, reason);
                }
            }
        }

        if let Some((min, max)) = ctx.site_count_band {
            if !(min..=max).contains(&sites.len()) {
                warn!("Site count {} outside expected band {}..={}", sites.len(), min, max);
                anomalies.push(format!(
                    "Unexpected site count: {} (expected {}..={}) across {} records inspected",
                    sites.len(),
                    min,
                    max,
                    records.len()
                ));
            }
        }

        let source = ctx.final_npl_only.then(|| NPL_SOURCE_NOTE.to_string());
        let snapshot = SuperfundSnapshot::new(ctx.as_of.format("%Y-%m-%d").to_string(), source, sites);

        Ok(Conversion {
            records_written: snapshot.sites.len(),
            records_dropped: dropped,
            anomalies,
            document: serde_json::to_value(&snapshot)?,
        })
    }
}
