pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod types;

pub mod pipeline;

// Browser-side views computed from the published datasets
pub mod geocode;
pub mod map;
pub mod snapshot;

// Outbound ports and their adapters
pub mod app;
pub mod infra;
