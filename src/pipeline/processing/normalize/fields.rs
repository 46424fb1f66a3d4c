//! Candidate source headers per logical field.
//!
//! EPA exports rename, renumber and re-case their columns between releases. Each logical field
//! lists the canonical spellings seen so far in priority order; new header drift is handled by
//! adding a spelling here.

/// Ordered canonical header names for one logical field
#[derive(Debug, Clone, Copy)]
pub struct FieldCandidates {
    pub field: &'static str,
    pub names: &'static [&'static str],
}

macro_rules! candidates {
    ($ident:ident, $field:literal, [$($name:literal),+ $(,)?]) => {
        pub const $ident: FieldCandidates = FieldCandidates {
            field: $field,
            names: &[$($name),+],
        };
    };
}

// TRI facility records
candidates!(FACILITY, "facility", [
    "FACILITY NAME", "FACILITY_NAME", "FACILITY", "TRI FACILITY NAME",
    "POTW NAME 1", "POTW_NAME_1", "OFF-SITE LOC NAME 1", "OFF_SITE_LOC_NAME_1",
]);
candidates!(CHEMICAL, "chemical", ["CHEMICAL", "CHEMICAL NAME", "CHEMICAL_NAME"]);
candidates!(YEAR, "year", ["YEAR", "REPORTING YEAR", "REPORTING_YEAR"]);

// TRI release quantities, in pounds
candidates!(ON_SITE_TOTAL, "on_site_release_total", [
    "ON-SITE RELEASE TOTAL", "ON_SITE_RELEASE_TOTAL", "ON-SITE RELEASE TOTALS", "TOTAL ON-SITE RELEASES",
]);
candidates!(OFF_SITE_TOTAL, "off_site_release_total", [
    "OFF-SITE RELEASE TOTAL", "OFF_SITE_RELEASE_TOTAL", "TOTAL OFF-SITE RELEASES",
]);
candidates!(FUGITIVE_AIR, "fugitive_air", [
    "5.1 - FUGITIVE AIR", "FUGITIVE AIR", "FUGITIVE TOT REL", "FUGITIVE_TOT_REL",
]);
candidates!(STACK_AIR, "stack_air", [
    "5.2 - STACK AIR", "STACK AIR", "STACK TOT REL", "STACK_TOT_REL",
]);
candidates!(AIR_TOTAL, "air_total", ["AIR TOTAL RELEASE", "AIR_TOTAL_RELEASE"]);
candidates!(WATER, "water", [
    "5.3 - WATER", "WATER", "WATER TOTAL RELEASE", "WATER_TOTAL_RELEASE",
]);
candidates!(UNDERGROUND_CLASS_I, "underground_class_i", [
    "5.4.1 - UNDERGROUND CL I", "UNDERGROUND CL I", "UNDERGROUND", "UNDERGROUND_CL_I",
]);
candidates!(UNDERGROUND_CLASS_II_V, "underground_class_ii_v", [
    "5.4.2 - UNDERGROUND C II-V", "UNDERGROUND C II-V", "UNDERGROUND_C_II_V",
]);
candidates!(LANDFILL, "landfill", [
    "5.5.1 - LANDFILLS", "LANDFILLS", "LANDFILL",
]);
candidates!(LAND_TREATMENT, "land_treatment", ["5.5.2 - LAND TREATMENT", "LAND TREATMENT", "LAND_TREATMENT"]);
candidates!(SURFACE_IMPOUNDMENT, "surface_impoundment", [
    "5.5.3 - SURFACE IMPNDMNT", "SURFACE IMPNDMNT", "SURFACE IMPOUNDMENT", "SURFACE_IMPOUNDMENT",
]);
candidates!(OTHER_DISPOSAL, "other_disposal", ["5.5.4 - OTHER DISPOSAL", "OTHER DISPOSAL", "OTHER_DISPOSAL"]);
candidates!(LAND_TOTAL, "land_total", ["LAND TOTAL RELEASE", "LAND_TOTAL_RELEASE"]);

// Superfund / NPL sites
candidates!(SITE_NAME, "site_name", ["SITE_NAME", "SITE NAME", "NAME"]);
candidates!(CITY, "city", ["CITY", "SITE_CITY", "FAC_CITY"]);
candidates!(STATE, "state", ["STATE", "STATE_CODE", "FAC_STATE"]);
candidates!(NPL_STATUS, "npl_status", ["NPL_STATUS", "NPL STATUS", "STATUS"]);
candidates!(CONTAMINANTS, "contaminants", ["CONTAMINANTS", "CONTAMINANTS_OF_CONCERN"]);
candidates!(REMEDY, "remedy", ["REMEDY"]);
candidates!(CLEANUP_COST, "estimated_cleanup_cost", ["CLEANUP_COST", "ESTIMATED_CLEANUP_COST"]);
candidates!(EPA_ID, "epa_id", ["SITE_EPA_ID", "EPA_ID"]);
candidates!(SEMS_ID, "site_id", ["SEMS_ID", "SITE_ID"]);
candidates!(REGION, "region", ["REGION_ID", "REGION"]);
candidates!(COUNTY, "county", ["COUNTY"]);
candidates!(PROPOSED_DATE, "proposed_date", ["PROPOSED_DATE"]);
candidates!(LISTING_DATE, "listing_date", ["LISTING_DATE", "FINAL_DATE"]);
candidates!(CONSTRUCTION_COMPLETION_DATE, "construction_completion_date", ["CONSTRUCTION_COMPLETION_DATE"]);
candidates!(DELETION_DATE, "deletion_date", ["DELETION_DATE"]);
candidates!(DELETION_NOTICE, "deletion_notice", ["DELETION_FR_NOTICE", "DELETION_NOTICE"]);

// ECHO exporter facilities
candidates!(ECHO_FACILITY, "facility", ["FAC_NAME", "FACILITY NAME", "FACILITY"]);
candidates!(ECHO_PENALTY, "penalty", ["FAC_TOTAL_PENALTIES", "PENALTY"]);
candidates!(ECHO_COUNT, "count", ["FAC_PENALTY_COUNT", "COUNT"]);

/// (latitude, longitude) key pairs, tried in order. Geometry wins over attribute coordinates.
pub const COORDINATE_PAIRS: &[(&str, &str)] = &[
    ("GEOMETRY.COORDINATES.1", "GEOMETRY.COORDINATES.0"),
    ("GEOMETRY.Y", "GEOMETRY.X"),
    ("LATITUDE", "LONGITUDE"),
    ("LAT", "LON"),
    ("LAT", "LNG"),
    ("FAC_LAT", "FAC_LONG"),
];

/// ECHO program compliance statuses and the violation label each maps to, in priority order
pub const COMPLIANCE_PROGRAMS: &[(&str, &str)] = &[
    ("CAA_COMPLIANCE_STATUS", "Clean Air Act violation"),
    ("CWA_COMPLIANCE_STATUS", "Clean Water Act violation"),
    ("RCRA_COMPLIANCE_STATUS", "RCRA hazardous waste violation"),
    ("SDWA_COMPLIANCE_STATUS", "Safe Drinking Water Act violation"),
];
