// Core structs: donation records, visits, merged rows and error types
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// One row of `donations_state.csv`: a state's donations on a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationRecord {
    pub state: String,
    pub date: NaiveDate,
    pub daily: i64,
    pub donations_regular: i64,
    pub donations_irregular: i64,
}

/// One row of `newdonors_state.csv`, restricted to the declared age buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonorRecord {
    pub state: String,
    pub date: NaiveDate,
    pub age_bucket_counts: BTreeMap<String, i64>,
}

/// A single donation event from the granular dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct GranularVisit {
    pub donor_id: String,
    pub visit_date: NaiveDate,
}

/// Donation and new-donor rows joined on (date, state).
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDonorRecord {
    pub state: String,
    pub date: NaiveDate,
    pub daily: i64,
    pub donations_regular: i64,
    pub donations_irregular: i64,
    pub total_donations: i64,
    pub age_bucket_counts: BTreeMap<String, i64>,
}

/// Rows that carry a state and a calendar date; the key used by the aligner.
pub trait StateDated {
    fn state(&self) -> &str;
    fn date(&self) -> NaiveDate;
}

impl StateDated for DonationRecord {
    fn state(&self) -> &str {
        &self.state
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl StateDated for NewDonorRecord {
    fn state(&self) -> &str {
        &self.state
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl StateDated for MergedDonorRecord {
    fn state(&self) -> &str {
        &self.state
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP error while fetching {location}: {message}")]
    Http { location: String, message: String },
    #[error("{location} responded with status {status}")]
    Status { location: String, status: u16 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("{source_name}: missing columns {missing:?}")]
    SchemaMismatch {
        source_name: String,
        missing: Vec<String>,
    },
    #[error("{source_name}: unparseable date {value:?} in column `{column}` (line {line})")]
    InvalidDate {
        source_name: String,
        column: String,
        value: String,
        line: u64,
    },
    #[error("{source_name}: empty value in column `{column}` (row {line})")]
    MissingValue {
        source_name: String,
        column: String,
        line: u64,
    },
    #[error("{source_name}: unparseable number {value:?} in column `{column}` (line {line})")]
    InvalidNumber {
        source_name: String,
        column: String,
        value: String,
        line: u64,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: String, value: String },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Telegram API error: {0}")]
    ApiError(String),
    #[error("Telegram unreachable")]
    Unreachable,
    #[error("Telegram token or chat id not configured")]
    NotConfigured,
}
