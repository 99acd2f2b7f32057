// Parquet reading for the published granular visit dump
use crate::loader::csv_parser::VISITS_COLUMNS;
use crate::model::{GranularVisit, LoadError};
use crate::utils::parse_date;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, TimeDelta};
use parquet::basic::{LogicalType, TimeUnit};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;

const SOURCE_NAME: &str = "granular";
const MAGIC: &[u8; 4] = b"PAR1";

/// Parquet files open and close with the `PAR1` magic.
pub fn is_parquet(data: &[u8]) -> bool {
    data.len() >= 2 * MAGIC.len() && data.starts_with(MAGIC) && data.ends_with(MAGIC)
}

/// Reads `donor_id` and `visit_date` from every row of a parquet file.
///
/// `visit_date` may be stored as a DATE, a millisecond, microsecond or
/// nanosecond timestamp, or a string; only the calendar day is kept.
pub fn parse_visits_parquet(data: Bytes) -> Result<Vec<GranularVisit>, LoadError> {
    let reader = SerializedFileReader::new(data)?;
    let schema = reader.metadata().file_metadata().schema_descr();

    let missing: Vec<String> = VISITS_COLUMNS
        .iter()
        .filter(|c| !schema.columns().iter().any(|col| col.name() == **c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::SchemaMismatch {
            source_name: SOURCE_NAME.to_string(),
            missing,
        });
    }

    let nanos = schema.columns().iter().any(|col| {
        col.name() == "visit_date"
            && matches!(
                col.logical_type(),
                Some(LogicalType::Timestamp { unit: TimeUnit::NANOS(_), .. })
            )
    });

    let mut visits = Vec::with_capacity(reader.metadata().file_metadata().num_rows().max(0) as usize);
    for (i, row) in reader.get_row_iter(None)?.enumerate() {
        let row = row?;
        let line = i as u64 + 1;

        let mut donor_id = None;
        let mut visit_date = None;
        for (name, field) in row.get_column_iter() {
            match name.as_str() {
                "donor_id" => donor_id = Some(field),
                "visit_date" => visit_date = Some(field),
                _ => {}
            }
        }

        visits.push(GranularVisit {
            donor_id: donor_text(donor_id, line)?,
            visit_date: visit_day(visit_date, nanos, line)?,
        });
    }
    Ok(visits)
}

fn donor_text(field: Option<&Field>, line: u64) -> Result<String, LoadError> {
    match field {
        Some(Field::Str(id)) => Ok(id.clone()),
        Some(field @ (Field::Int(_) | Field::Long(_) | Field::UInt(_) | Field::ULong(_))) => {
            Ok(field.to_string())
        }
        _ => Err(LoadError::MissingValue {
            source_name: SOURCE_NAME.to_string(),
            column: "donor_id".to_string(),
            line,
        }),
    }
}

fn visit_day(field: Option<&Field>, nanos: bool, line: u64) -> Result<NaiveDate, LoadError> {
    let Some(field) = field else {
        return Err(LoadError::MissingValue {
            source_name: SOURCE_NAME.to_string(),
            column: "visit_date".to_string(),
            line,
        });
    };
    let day = match field {
        Field::Date(days) => TimeDelta::try_days(i64::from(*days))
            .and_then(|delta| DateTime::UNIX_EPOCH.date_naive().checked_add_signed(delta)),
        Field::TimestampMillis(ms) => DateTime::from_timestamp_millis(*ms).map(|t| t.date_naive()),
        Field::TimestampMicros(us) => DateTime::from_timestamp_micros(*us).map(|t| t.date_naive()),
        Field::Long(ns) if nanos => Some(DateTime::from_timestamp_nanos(*ns).date_naive()),
        Field::Str(text) => parse_date(text),
        _ => None,
    };
    day.ok_or_else(|| LoadError::InvalidDate {
        source_name: SOURCE_NAME.to_string(),
        column: "visit_date".to_string(),
        value: field.to_string(),
        line,
    })
}
