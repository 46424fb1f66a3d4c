use serde::Serialize;

use super::normalize::fields::{
    AIR_TOTAL, FUGITIVE_AIR, LANDFILL, LAND_TOTAL, LAND_TREATMENT, OFF_SITE_TOTAL, ON_SITE_TOTAL,
    OTHER_DISPOSAL, STACK_AIR, SURFACE_IMPOUNDMENT, UNDERGROUND_CLASS_I, UNDERGROUND_CLASS_II_V,
    WATER,
};
use super::normalize::{FieldCandidates, NormalizedRecord};

/// Where a record's release total came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReleaseSource {
    /// The reported on-site release total (plus off-site, when enabled)
    ReportedTotal,
    /// Sum of the individual release channels
    ChannelSum,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub lbs: f64,
    pub source: ReleaseSource,
}

/// How `release_lbs` is computed from a TRI row.
///
/// A reported on-site total greater than zero is used as-is; component columns are never added
/// on top of it, since they are already contained in it. Without one, the channels are summed.
/// Within the air and land channels a reported channel total is only a fallback for when none of
/// the detailed columns are present. Off-site releases are tracked separately by TRI and are added
/// in both cases when `include_off_site` is set. Negative values are kept as reported.
#[derive(Debug, Clone, Copy)]
pub struct ReleasePolicy {
    pub include_off_site: bool,
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        Self {
            include_off_site: true,
        }
    }
}

const LAND_DETAIL: [FieldCandidates; 4] = [LANDFILL, LAND_TREATMENT, SURFACE_IMPOUNDMENT, OTHER_DISPOSAL];

impl ReleasePolicy {
    pub fn aggregate(&self, record: &NormalizedRecord) -> Release {
        let off_site = if self.include_off_site {
            record.number_or_zero(&OFF_SITE_TOTAL)
        } else {
            0.0
        };

        if let Some(on_site) = record.number(&ON_SITE_TOTAL).filter(|total| *total > 0.0) {
            return Release {
                lbs: on_site + off_site,
                source: ReleaseSource::ReportedTotal,
            };
        }

        let lbs = air(record)
            + record.number_or_zero(&WATER)
            + record.number_or_zero(&UNDERGROUND_CLASS_I)
            + record.number_or_zero(&UNDERGROUND_CLASS_II_V)
            + land(record)
            + off_site;

        Release {
            lbs,
            source: ReleaseSource::ChannelSum,
        }
    }
}

fn air(record: &NormalizedRecord) -> f64 {
    match (record.number(&FUGITIVE_AIR), record.number(&STACK_AIR)) {
        (None, None) => record.number_or_zero(&AIR_TOTAL),
        (fugitive, stack) => fugitive.unwrap_or(0.0) + stack.unwrap_or(0.0),
    }
}

fn land(record: &NormalizedRecord) -> f64 {
    let detail: Vec<f64> = LAND_DETAIL.iter().filter_map(|c| record.number(c)).collect();
    if detail.is_empty() {
        record.number_or_zero(&LAND_TOTAL)
    } else {
        detail.iter().sum()
    }
}
