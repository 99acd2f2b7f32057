// CSV parsing for the public blood-donation datasets
use crate::model::{DonationRecord, GranularVisit, LoadError, NewDonorRecord};
use crate::utils::parse_date;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{BTreeMap, HashMap};

pub const DONATIONS_COLUMNS: [&str; 5] = [
    "date",
    "state",
    "daily",
    "donations_regular",
    "donations_irregular",
];
pub const NEW_DONORS_COLUMNS: [&str; 2] = ["date", "state"];
pub const VISITS_COLUMNS: [&str; 2] = ["donor_id", "visit_date"];

/// Header positions of one table, checked against the columns it must carry.
struct Columns {
    source_name: String,
    index: HashMap<String, usize>,
}

impl Columns {
    fn require(source_name: &str, headers: &StringRecord, required: &[&str]) -> Result<Self, LoadError> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_string(), i))
            .collect();

        let missing: Vec<String> = required
            .iter()
            .filter(|c| !index.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::SchemaMismatch {
                source_name: source_name.to_string(),
                missing,
            });
        }

        Ok(Self {
            source_name: source_name.to_string(),
            index,
        })
    }

    fn text<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.index
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    fn date(&self, record: &StringRecord, column: &str) -> Result<chrono::NaiveDate, LoadError> {
        let value = self.text(record, column);
        parse_date(value).ok_or_else(|| LoadError::InvalidDate {
            source_name: self.source_name.clone(),
            column: column.to_string(),
            value: value.to_string(),
            line: line_of(record),
        })
    }

    /// Non-negative integer counts; the public files sometimes write them as `12.0`.
    fn count(&self, record: &StringRecord, column: &str) -> Result<i64, LoadError> {
        let value = self.text(record, column);
        let parsed = value.parse::<i64>().ok().or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        });
        parsed.filter(|&n| n >= 0).ok_or_else(|| LoadError::InvalidNumber {
            source_name: self.source_name.clone(),
            column: column.to_string(),
            value: value.to_string(),
            line: line_of(record),
        })
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn records(data: &[u8]) -> Result<(StringRecord, Vec<StringRecord>), LoadError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(data);
    let headers = reader.headers()?.clone();
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok((headers, rows))
}

/// Parses `donations_state.csv`. Columns beyond the five used ones are ignored.
pub fn parse_donations(data: impl AsRef<[u8]>) -> Result<Vec<DonationRecord>, LoadError> {
    let (headers, rows) = records(data.as_ref())?;
    let cols = Columns::require("donations_state", &headers, &DONATIONS_COLUMNS)?;

    rows.iter().map(|row| donation_row(&cols, row)).collect()
}

fn donation_row(cols: &Columns, row: &StringRecord) -> Result<DonationRecord, LoadError> {
    Ok(DonationRecord {
        state: cols.text(row, "state").to_string(),
        date: cols.date(row, "date")?,
        daily: cols.count(row, "daily")?,
        donations_regular: cols.count(row, "donations_regular")?,
        donations_irregular: cols.count(row, "donations_irregular")?,
    })
}

/// Parses `newdonors_state.csv`, keeping exactly the declared age buckets.
///
/// Every bucket label must be present as a column; other columns (`total`,
/// `other`, ...) are ignored.
pub fn parse_new_donors(
    data: impl AsRef<[u8]>,
    buckets: &[String],
) -> Result<Vec<NewDonorRecord>, LoadError> {
    let (headers, rows) = records(data.as_ref())?;
    let mut required: Vec<&str> = NEW_DONORS_COLUMNS.to_vec();
    required.extend(buckets.iter().map(String::as_str));
    let cols = Columns::require("newdonors_state", &headers, &required)?;

    rows.iter().map(|row| new_donor_row(&cols, row, buckets)).collect()
}

fn new_donor_row(
    cols: &Columns,
    row: &StringRecord,
    buckets: &[String],
) -> Result<NewDonorRecord, LoadError> {
    let mut age_bucket_counts = BTreeMap::new();
    for bucket in buckets {
        age_bucket_counts.insert(bucket.clone(), cols.count(row, bucket)?);
    }
    Ok(NewDonorRecord {
        state: cols.text(row, "state").to_string(),
        date: cols.date(row, "date")?,
        age_bucket_counts,
    })
}

/// Parses the granular visit table (`donor_id`, `visit_date`) from CSV.
pub fn parse_visits(data: impl AsRef<[u8]>) -> Result<Vec<GranularVisit>, LoadError> {
    let (headers, rows) = records(data.as_ref())?;
    let cols = Columns::require("granular", &headers, &VISITS_COLUMNS)?;

    rows.iter().map(|row| visit_row(&cols, row)).collect()
}

fn visit_row(cols: &Columns, row: &StringRecord) -> Result<GranularVisit, LoadError> {
    Ok(GranularVisit {
        donor_id: cols.text(row, "donor_id").to_string(),
        visit_date: cols.date(row, "visit_date")?,
    })
}
