use crate::model::GranularVisit;
use chrono::Datelike;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Distinct-donor counts indexed by (cohort year, elapsed years).
///
/// A cohort is every donor whose first visit fell in the same calendar year.
/// Combinations with no donor-year are absent rather than zero: a gap such as
/// elapsed 0 and 2 present with 1 missing means nobody from that cohort
/// donated in the intervening year, or the input was incomplete. The matrix
/// does not guess which.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortMatrix {
    cells: BTreeMap<i32, BTreeMap<u32, u64>>,
}

impl CohortMatrix {
    pub fn build(visits: &[GranularVisit]) -> Self {
        let mut first_year: HashMap<&str, i32> = HashMap::new();
        for visit in visits {
            let year = visit.visit_date.year();
            first_year
                .entry(visit.donor_id.as_str())
                .and_modify(|y| *y = (*y).min(year))
                .or_insert(year);
        }

        let mut donors: HashMap<(i32, u32), HashSet<&str>> = HashMap::new();
        for visit in visits {
            let id = visit.donor_id.as_str();
            let Some(&cohort) = first_year.get(id) else {
                continue;
            };
            let elapsed = (visit.visit_date.year() - cohort) as u32;
            donors.entry((cohort, elapsed)).or_default().insert(id);
        }

        let mut cells: BTreeMap<i32, BTreeMap<u32, u64>> = BTreeMap::new();
        for ((cohort, elapsed), ids) in donors {
            cells.entry(cohort).or_default().insert(elapsed, ids.len() as u64);
        }

        Self { cells }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row labels, ascending.
    pub fn cohort_years(&self) -> Vec<i32> {
        self.cells.keys().copied().collect()
    }

    pub fn count(&self, cohort: i32, elapsed: u32) -> Option<u64> {
        self.cells.get(&cohort).and_then(|row| row.get(&elapsed)).copied()
    }

    pub fn cohort_size(&self, cohort: i32) -> Option<u64> {
        self.count(cohort, 0)
    }

    pub fn max_elapsed(&self) -> Option<u32> {
        self.cells
            .values()
            .filter_map(|row| row.keys().next_back().copied())
            .max()
    }

    pub fn retention(&self) -> RetentionMatrix {
        let rows = self
            .cells
            .iter()
            .map(|(&cohort, row)| {
                let base = row.get(&0).copied().unwrap_or(0);
                let rates = row
                    .iter()
                    .filter(|_| base > 0)
                    .map(|(&elapsed, &count)| (elapsed, count as f64 / base as f64))
                    .collect();
                (cohort, rates)
            })
            .collect();
        RetentionMatrix { rows }
    }
}

/// Cell-wise `count / cohort size`, fractions in [0, 1].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetentionMatrix {
    rows: BTreeMap<i32, BTreeMap<u32, f64>>,
}

impl RetentionMatrix {
    pub fn cohort_years(&self) -> Vec<i32> {
        self.rows.keys().copied().collect()
    }

    pub fn rate(&self, cohort: i32, elapsed: u32) -> Option<f64> {
        self.rows.get(&cohort).and_then(|row| row.get(&elapsed)).copied()
    }

    pub fn max_elapsed(&self) -> Option<u32> {
        self.rows
            .values()
            .filter_map(|row| row.keys().next_back().copied())
            .max()
    }
}

pub fn distinct_donors_per_year(visits: &[GranularVisit]) -> BTreeMap<i32, u64> {
    let mut years: BTreeMap<i32, HashSet<&str>> = BTreeMap::new();
    for visit in visits {
        years
            .entry(visit.visit_date.year())
            .or_default()
            .insert(visit.donor_id.as_str());
    }
    years.into_iter().map(|(y, ids)| (y, ids.len() as u64)).collect()
}
