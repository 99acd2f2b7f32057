use crate::model::DonationRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Calendar granularity used to bucket daily records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Month,
    Year,
}

impl Period {
    /// First day of the month or year containing `date`.
    pub fn start_of(self, date: NaiveDate) -> NaiveDate {
        let start = match self {
            Period::Month => date.with_day(1),
            Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        };
        // Day 1 of an existing month/year always exists.
        start.unwrap_or(date)
    }
}

/// Summed measures for one (state, period) bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodAggregate {
    pub state: String,
    pub period_start: NaiveDate,
    pub daily: i64,
    pub donations_regular: i64,
    pub donations_irregular: i64,
}

impl PeriodAggregate {
    pub fn year(&self) -> i32 {
        self.period_start.year()
    }
}

/// Groups records by (state, period) and sums their measures.
///
/// Only buckets with at least one record are emitted; output is ordered by
/// state, then period. Rows sharing a state and date are summed.
pub fn aggregate(records: &[DonationRecord], period: Period) -> Vec<PeriodAggregate> {
    let mut buckets: BTreeMap<(String, NaiveDate), PeriodAggregate> = BTreeMap::new();

    for record in records {
        let period_start = period.start_of(record.date);
        let entry = buckets
            .entry((record.state.clone(), period_start))
            .or_insert_with(|| PeriodAggregate {
                state: record.state.clone(),
                period_start,
                daily: 0,
                donations_regular: 0,
                donations_irregular: 0,
            });

        entry.daily += record.daily;
        entry.donations_regular += record.donations_regular;
        entry.donations_irregular += record.donations_irregular;
    }

    buckets.into_values().collect()
}

pub fn only_state(rows: &[PeriodAggregate], state: &str) -> Vec<PeriodAggregate> {
    rows.iter().filter(|r| r.state == state).cloned().collect()
}

pub fn without_state(rows: &[PeriodAggregate], state: &str) -> Vec<PeriodAggregate> {
    rows.iter().filter(|r| r.state != state).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;

    fn record(state: &str, y: i32, m: u32, d: u32, daily: i64, reg: i64, irr: i64) -> DonationRecord {
        DonationRecord {
            state: state.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            daily,
            donations_regular: reg,
            donations_irregular: irr,
        }
    }

    #[test]
    fn sums_days_within_a_month() {
        let records = vec![record("X", 2020, 1, 3, 10, 4, 6), record("X", 2020, 1, 28, 20, 5, 15)];
        let monthly = aggregate(&records, Period::Month);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].daily, 30);
        assert_eq!(monthly[0].donations_regular, 9);
        assert_eq!(monthly[0].donations_irregular, 21);
        assert_eq!(monthly[0].period_start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn duplicate_dates_are_summed_not_overwritten() {
        let records = vec![record("X", 2020, 5, 5, 7, 0, 0), record("X", 2020, 5, 5, 8, 0, 0)];
        let monthly = aggregate(&records, Period::Month);
        assert_eq!(monthly[0].daily, 15);
    }

    #[test]
    fn empty_months_produce_no_rows() {
        let records = vec![record("X", 2020, 1, 1, 1, 0, 0), record("X", 2020, 4, 1, 1, 0, 0)];
        let monthly = aggregate(&records, Period::Month);
        let starts: Vec<u32> = monthly.iter().map(|r| r.period_start.month()).collect();
        assert_eq!(starts, vec![1, 4]);
    }

    #[test]
    fn yearly_buckets_and_national_rows_kept() {
        let records = vec![
            record("Malaysia", 2019, 3, 1, 100, 0, 0),
            record("Malaysia", 2019, 11, 1, 50, 0, 0),
            record("Johor", 2019, 6, 1, 5, 0, 0),
            record("Johor", 2020, 6, 1, 6, 0, 0),
        ];
        let yearly = aggregate(&records, Period::Year);
        assert_eq!(yearly.len(), 3);

        let national = only_state(&yearly, "Malaysia");
        assert_eq!(national.len(), 1);
        assert_eq!(national[0].daily, 150);
        assert_eq!(national[0].year(), 2019);

        let states = without_state(&yearly, "Malaysia");
        assert!(states.iter().all(|r| r.state == "Johor"));
        assert_eq!(states.len(), 2);
    }

    #[test]
    fn shuffling_input_does_not_change_sums() {
        let mut records = Vec::new();
        for (i, state) in ["A", "B", "C"].iter().enumerate() {
            for m in 1..=12 {
                for d in [1, 9, 17, 25] {
                    let v = (i as i64 + 1) * (m as i64) + d as i64;
                    records.push(record(state, 2021, m, d, v, v / 2, v / 3));
                }
            }
        }
        let expected = aggregate(&records, Period::Month);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5 {
            records.shuffle(&mut rng);
            assert_eq!(aggregate(&records, Period::Month), expected);
        }
    }
}
