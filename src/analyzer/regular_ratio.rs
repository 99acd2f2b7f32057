use crate::analyzer::aggregation::PeriodAggregate;
use crate::utils::percentage;
use chrono::NaiveDate;

/// Share of classified donations that came from regular donors in one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularRatio {
    pub state: String,
    pub period_start: NaiveDate,
    pub total: i64,
    /// `None` when the bucket has no classified donations.
    pub percentage_regular: Option<f64>,
}

impl RegularRatio {
    pub fn percentage_irregular(&self) -> Option<f64> {
        self.percentage_regular.map(|p| 100.0 - p)
    }
}

pub fn percentage_regular(donations_regular: i64, donations_irregular: i64) -> Option<f64> {
    percentage(donations_regular, donations_regular + donations_irregular)
}

pub fn regular_ratios(rows: &[PeriodAggregate]) -> Vec<RegularRatio> {
    rows.iter()
        .map(|row| RegularRatio {
            state: row.state.clone(),
            period_start: row.period_start,
            total: row.donations_regular + row.donations_irregular,
            percentage_regular: percentage_regular(row.donations_regular, row.donations_irregular),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(reg: i64, irr: i64) -> PeriodAggregate {
        PeriodAggregate {
            state: "Malaysia".to_string(),
            period_start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            daily: reg + irr,
            donations_regular: reg,
            donations_irregular: irr,
        }
    }

    #[test]
    fn zero_total_is_undefined() {
        let ratios = regular_ratios(&[row(0, 0)]);
        assert_eq!(ratios[0].total, 0);
        assert_eq!(ratios[0].percentage_regular, None);
        assert_eq!(ratios[0].percentage_irregular(), None);
    }

    #[test]
    fn regular_and_irregular_sum_to_hundred() {
        for (reg, irr) in [(1, 3), (7, 0), (0, 9), (123, 456)] {
            let ratio = &regular_ratios(&[row(reg, irr)])[0];
            let sum = ratio.percentage_regular.unwrap() + ratio.percentage_irregular().unwrap();
            assert!((sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn computes_share() {
        assert_eq!(percentage_regular(3, 1), Some(75.0));
    }
}
