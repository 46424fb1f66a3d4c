// Pipeline ingestion: reading raw export files into raw records

pub mod npl_fetch;
pub mod reader;

pub use npl_fetch::fetch_npl;
pub use reader::{read_records, RawBatch, SourceFormat};
