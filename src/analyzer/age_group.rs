use crate::model::{DonationRecord, MergedDonorRecord, NewDonorRecord};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Age-range columns of `newdonors_state.csv`, youngest first.
pub const DEFAULT_AGE_BUCKETS: [&str; 9] = [
    "17-24", "25-29", "30-34", "35-39", "40-44", "45-49", "50-54", "55-59", "60-64",
];

/// How an age bucket's yearly count is turned into a retention figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroupMode {
    /// Bucket count divided by the same year's regular donations.
    RatioToTotal,
    /// Bucket count divided by the same bucket's count in the previous year.
    #[default]
    YearOverYear,
}

/// Inner join of donation and new-donor rows on (date, state).
pub fn merge_donor_records(
    donations: &[DonationRecord],
    new_donors: &[NewDonorRecord],
) -> Vec<MergedDonorRecord> {
    let mut by_key: HashMap<(NaiveDate, &str), Vec<&NewDonorRecord>> = HashMap::new();
    for row in new_donors {
        by_key.entry((row.date, row.state.as_str())).or_default().push(row);
    }

    let mut merged = Vec::new();
    for donation in donations {
        let Some(matches) = by_key.get(&(donation.date, donation.state.as_str())) else {
            continue;
        };
        for new_donor in matches {
            merged.push(MergedDonorRecord {
                state: donation.state.clone(),
                date: donation.date,
                daily: donation.daily,
                donations_regular: donation.donations_regular,
                donations_irregular: donation.donations_irregular,
                total_donations: donation.donations_regular + donation.donations_irregular,
                age_bucket_counts: new_donor.age_bucket_counts.clone(),
            });
        }
    }
    merged
}

/// Yearly sums of every age bucket and of regular donations.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyAgeTotals {
    pub year: i32,
    pub age_counts: BTreeMap<String, i64>,
    pub donations_regular: i64,
}

pub fn yearly_totals<'a, I>(rows: I, buckets: &[String]) -> Vec<YearlyAgeTotals>
where
    I: IntoIterator<Item = &'a MergedDonorRecord>,
{
    let mut years: BTreeMap<i32, YearlyAgeTotals> = BTreeMap::new();
    for row in rows {
        let year = row.date.year();
        let entry = years.entry(year).or_insert_with(|| YearlyAgeTotals {
            year,
            age_counts: buckets.iter().map(|b| (b.clone(), 0)).collect(),
            donations_regular: 0,
        });
        entry.donations_regular += row.donations_regular;
        for bucket in buckets {
            let count = row.age_bucket_counts.get(bucket).copied().unwrap_or(0);
            *entry.age_counts.entry(bucket.clone()).or_insert(0) += count;
        }
    }
    years.into_values().collect()
}

/// Retention fractions, rows = year, columns = age bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeGroupRetention {
    pub mode: AgeGroupMode,
    pub years: Vec<i32>,
    pub buckets: Vec<String>,
    cells: BTreeMap<(i32, String), f64>,
}

impl AgeGroupRetention {
    /// `None` for undefined cells (zero or missing denominator, no predecessor).
    pub fn rate(&self, year: i32, bucket: &str) -> Option<f64> {
        self.cells.get(&(year, bucket.to_string())).copied()
    }
}

pub fn age_group_retention(
    totals: &[YearlyAgeTotals],
    buckets: &[String],
    mode: AgeGroupMode,
) -> AgeGroupRetention {
    let mut sorted: Vec<&YearlyAgeTotals> = totals.iter().collect();
    sorted.sort_by_key(|t| t.year);

    let mut cells = BTreeMap::new();
    match mode {
        AgeGroupMode::RatioToTotal => {
            for year in &sorted {
                if year.donations_regular == 0 {
                    continue;
                }
                for bucket in buckets {
                    let count = year.age_counts.get(bucket).copied().unwrap_or(0);
                    cells.insert(
                        (year.year, bucket.clone()),
                        count as f64 / year.donations_regular as f64,
                    );
                }
            }
        }
        AgeGroupMode::YearOverYear => {
            for bucket in buckets {
                let counts = sorted.iter().map(|t| {
                    let count = t.age_counts.get(bucket).copied().filter(|&c| c != 0);
                    (t.year, count)
                });
                let mut previous: Option<i64> = None;
                for (year, count) in counts {
                    if let (Some(current), Some(prior)) = (count, previous) {
                        cells.insert((year, bucket.clone()), current as f64 / prior as f64);
                    }
                    previous = count;
                }
            }
        }
    }

    AgeGroupRetention {
        mode,
        years: sorted.iter().map(|t| t.year).collect(),
        buckets: buckets.to_vec(),
        cells,
    }
}
