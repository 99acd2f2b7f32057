// Record loader: fetching raw tables and parsing them into typed records.

pub mod traits;
pub mod fetcher;
pub mod csv_parser;
pub mod parquet_parser;

pub use csv_parser::{parse_donations, parse_new_donors, parse_visits};
pub use fetcher::{AnySource, FileSource, HttpSource};
pub use parquet_parser::{is_parquet, parse_visits_parquet};
pub use traits::RecordSource;

use crate::model::{GranularVisit, LoadError};
use bytes::Bytes;

/// Granular visits come as parquet from the published link and as CSV from
/// local exports; the payload itself decides which reader runs.
pub fn parse_granular(data: Bytes) -> Result<Vec<GranularVisit>, LoadError> {
    if is_parquet(&data) {
        parse_visits_parquet(data)
    } else {
        parse_visits(&data)
    }
}
