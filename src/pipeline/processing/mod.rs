// Pipeline processing: field normalization, release aggregation, coordinate filtering, and
// the per-dataset converters built on them

pub mod converters;
pub mod geo;
pub mod normalize;
pub mod release;
