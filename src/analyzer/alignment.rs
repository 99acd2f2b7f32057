use crate::model::{GranularVisit, MergedDonorRecord, StateDated};
use crate::utils::percentage;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-day summary of granular visits, labelled with the state it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct GranularSummary {
    pub state: String,
    pub date: NaiveDate,
    pub visits: u64,
    pub distinct_donors: u64,
}

/// An aggregate row with the granular summary it was matched to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Aligned<T> {
    pub row: T,
    pub granular: Option<GranularSummary>,
}

impl<T> Aligned<T> {
    pub fn is_attached(&self) -> bool {
        self.granular.is_some()
    }
}

/// Collapses raw visits into one summary per visit date.
///
/// The granular dataset carries no state column, so the caller names the
/// scope the visits represent (normally the nationwide row).
pub fn summarize_visits(visits: &[GranularVisit], state: &str) -> Vec<GranularSummary> {
    let mut days: BTreeMap<NaiveDate, (u64, HashSet<&str>)> = BTreeMap::new();
    for visit in visits {
        let entry = days.entry(visit.visit_date).or_default();
        entry.0 += 1;
        entry.1.insert(visit.donor_id.as_str());
    }

    days.into_iter()
        .map(|(date, (visits, donors))| GranularSummary {
            state: state.to_string(),
            date,
            visits,
            distinct_donors: donors.len() as u64,
        })
        .collect()
}

/// As-of join: each row gets the latest summary of its state dated on or
/// before the row's date.
///
/// Both inputs are sorted here (stably), so among summaries sharing a date
/// the one inserted last wins. Rows without an eligible summary are kept
/// with `granular: None`. Output is ordered by date.
pub fn align<T: StateDated>(mut rows: Vec<T>, summaries: &[GranularSummary]) -> Vec<Aligned<T>> {
    let mut by_state: HashMap<&str, Vec<&GranularSummary>> = HashMap::new();
    for summary in summaries {
        by_state.entry(summary.state.as_str()).or_default().push(summary);
    }
    for candidates in by_state.values_mut() {
        candidates.sort_by_key(|s| s.date);
    }

    rows.sort_by_key(|r| r.date());

    rows.into_iter()
        .map(|row| {
            let granular = by_state.get(row.state()).and_then(|candidates| {
                let idx = candidates.partition_point(|s| s.date <= row.date());
                idx.checked_sub(1).map(|i| candidates[i].clone())
            });
            Aligned { row, granular }
        })
        .collect()
}

/// Yearly ratio of distinct granular donors to classified donations.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyTurnout {
    pub year: i32,
    pub total_donations: i64,
    pub distinct_donors: Option<u64>,
    /// Aggregate days of that year that found a granular summary.
    pub matched_days: usize,
    pub percentage: Option<f64>,
}

pub fn yearly_turnout(
    aligned: &[Aligned<MergedDonorRecord>],
    distinct_donors_per_year: &BTreeMap<i32, u64>,
) -> Vec<YearlyTurnout> {
    let mut years: BTreeMap<i32, (i64, usize)> = BTreeMap::new();
    for entry in aligned {
        let slot = years.entry(entry.row.date.year()).or_default();
        slot.0 += entry.row.total_donations;
        if entry.is_attached() {
            slot.1 += 1;
        }
    }

    years
        .into_iter()
        .map(|(year, (total_donations, matched_days))| {
            let distinct_donors = distinct_donors_per_year.get(&year).copied();
            let rate = distinct_donors.and_then(|d| percentage(d as i64, total_donations));
            YearlyTurnout {
                year,
                total_donations,
                distinct_donors,
                matched_days,
                percentage: rate,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DonationRecord, NewDonorRecord};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn summary(state: &str, d: NaiveDate, visits: u64) -> GranularSummary {
        GranularSummary {
            state: state.to_string(),
            date: d,
            visits,
            distinct_donors: visits,
        }
    }

    fn donation(state: &str, d: NaiveDate) -> DonationRecord {
        DonationRecord {
            state: state.to_string(),
            date: d,
            daily: 1,
            donations_regular: 1,
            donations_irregular: 0,
        }
    }

    #[test]
    fn attaches_nearest_preceding_summary() {
        let summaries = vec![summary("X", date(2020, 1, 1), 1), summary("X", date(2020, 3, 1), 2)];
        let aligned = align(vec![donation("X", date(2020, 2, 15))], &summaries);
        assert_eq!(aligned[0].granular.as_ref().unwrap().date, date(2020, 1, 1));
    }

    #[test]
    fn exact_date_matches() {
        let summaries = vec![summary("X", date(2020, 3, 1), 2)];
        let aligned = align(vec![donation("X", date(2020, 3, 1))], &summaries);
        assert_eq!(aligned[0].granular.as_ref().unwrap().visits, 2);
    }

    #[test]
    fn unmatched_rows_are_kept_unattached() {
        let summaries = vec![summary("X", date(2020, 3, 1), 2), summary("Y", date(2019, 1, 1), 9)];
        let aligned = align(
            vec![donation("X", date(2020, 2, 1)), donation("Z", date(2021, 1, 1))],
            &summaries,
        );
        assert_eq!(aligned.len(), 2);
        assert!(aligned.iter().all(|a| !a.is_attached()));
    }

    #[test]
    fn same_date_tie_goes_to_last_inserted() {
        let summaries = vec![
            summary("X", date(2020, 1, 1), 1),
            summary("X", date(2020, 1, 1), 2),
            summary("X", date(2020, 1, 1), 3),
        ];
        let aligned = align(vec![donation("X", date(2020, 1, 10))], &summaries);
        assert_eq!(aligned[0].granular.as_ref().unwrap().visits, 3);
    }

    #[test]
    fn sorts_unordered_inputs() {
        let summaries = vec![
            summary("X", date(2020, 6, 1), 6),
            summary("X", date(2020, 1, 1), 1),
            summary("X", date(2020, 3, 1), 3),
        ];
        let rows = vec![donation("X", date(2020, 7, 1)), donation("X", date(2020, 2, 1))];
        let aligned = align(rows, &summaries);
        assert_eq!(aligned[0].row.date, date(2020, 2, 1));
        assert_eq!(aligned[0].granular.as_ref().unwrap().visits, 1);
        assert_eq!(aligned[1].granular.as_ref().unwrap().visits, 6);
    }

    #[test]
    fn aligns_new_donor_rows() {
        let new_donor = |state: &str, d: NaiveDate| NewDonorRecord {
            state: state.to_string(),
            date: d,
            age_bucket_counts: BTreeMap::from([("17-24".to_string(), 4)]),
        };
        let summaries = vec![
            summary("Malaysia", date(2020, 1, 1), 1),
            summary("Malaysia", date(2020, 4, 1), 4),
            summary("Johor", date(2020, 3, 1), 9),
        ];
        let rows = vec![
            new_donor("Malaysia", date(2020, 5, 1)),
            new_donor("Malaysia", date(2020, 2, 1)),
            new_donor("Malaysia", date(2019, 12, 31)),
        ];
        let aligned = align(rows, &summaries);

        assert_eq!(aligned.len(), 3);
        assert!(!aligned[0].is_attached());
        assert_eq!(aligned[1].row.date, date(2020, 2, 1));
        assert_eq!(aligned[1].granular.as_ref().unwrap().visits, 1);
        assert_eq!(aligned[2].granular.as_ref().unwrap().visits, 4);
        assert_eq!(aligned[2].row.age_bucket_counts.get("17-24"), Some(&4));
    }

    #[test]
    fn summaries_count_visits_and_distinct_donors() {
        let visits = vec![
            GranularVisit { donor_id: "a".into(), visit_date: date(2020, 1, 1) },
            GranularVisit { donor_id: "a".into(), visit_date: date(2020, 1, 1) },
            GranularVisit { donor_id: "b".into(), visit_date: date(2020, 1, 1) },
            GranularVisit { donor_id: "b".into(), visit_date: date(2020, 1, 2) },
        ];
        let summaries = summarize_visits(&visits, "Malaysia");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].visits, 3);
        assert_eq!(summaries[0].distinct_donors, 2);
        assert_eq!(summaries[1].state, "Malaysia");
    }

    #[test]
    fn turnout_divides_distinct_donors_by_total() {
        let merged = |d: NaiveDate, total: i64| MergedDonorRecord {
            state: "Malaysia".into(),
            date: d,
            daily: total,
            donations_regular: total,
            donations_irregular: 0,
            total_donations: total,
            age_bucket_counts: BTreeMap::new(),
        };
        let summaries = vec![summary("Malaysia", date(2020, 6, 1), 1)];
        let aligned = align(
            vec![merged(date(2019, 5, 1), 40), merged(date(2020, 7, 1), 30), merged(date(2020, 8, 1), 20)],
            &summaries,
        );
        let donors = BTreeMap::from([(2020, 10u64)]);
        let turnout = yearly_turnout(&aligned, &donors);

        assert_eq!(turnout.len(), 2);
        assert_eq!(turnout[0].year, 2019);
        assert_eq!(turnout[0].percentage, None);
        assert_eq!(turnout[0].matched_days, 0);
        assert_eq!(turnout[1].total_donations, 50);
        assert_eq!(turnout[1].matched_days, 2);
        assert_eq!(turnout[1].percentage, Some(20.0));
    }
}
