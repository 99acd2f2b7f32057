use std::collections::BTreeSet;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::analyzer::aggregation::PeriodAggregate;
use crate::analyzer::regular_ratio::RegularRatio;
use crate::config::AnalysisConfig;
use crate::pipeline::RetentionReport;

/// One deliverable block of the report: a title and a plain-text table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub title: String,
    pub body: String,
}

impl ReportSection {
    pub fn to_message(&self) -> String {
        format!("{}\n\n{}", self.title, self.body)
    }
}

const UNDEFINED: &str = "n/a";

fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => UNDEFINED.to_string(),
    }
}

fn fraction_pct(value: Option<f64>) -> String {
    pct(value.map(|v| v * 100.0))
}

pub fn render(report: &RetentionReport, cfg: &AnalysisConfig) -> Vec<ReportSection> {
    vec![
        ReportSection {
            title: "Monthly Blood Donations Trend For States".to_string(),
            body: monthly_state_table(&report.monthly_by_state, cfg.report_months),
        },
        ReportSection {
            title: format!("Monthly Blood Donations Trend in {}", cfg.national_state),
            body: monthly_state_table(&report.monthly_national, cfg.report_months),
        },
        ReportSection {
            title: "Yearly Regular Donor Percentage by State".to_string(),
            body: regular_table(&report.yearly_regular_all),
        },
        ReportSection {
            title: format!("Yearly Regular Donor Percentage in {}", cfg.national_state),
            body: regular_table(&report.yearly_regular_national),
        },
        ReportSection {
            title: format!("Yearly Blood Donor Retention Trend in {}", cfg.national_state),
            body: turnout_table(report),
        },
        ReportSection {
            title: "Cohort Retention by First Donation Year".to_string(),
            body: cohort_table(report),
        },
        ReportSection {
            title: format!("Retention Rate by Age Group ({:?})", cfg.age_group_mode),
            body: age_group_table(report),
        },
    ]
}

/// Pivot of the last `months` periods: rows = month, columns = state.
fn monthly_state_table(rows: &[PeriodAggregate], months: usize) -> String {
    let mut output = String::new();
    if rows.is_empty() {
        let _ = writeln!(output, "No donations recorded.");
        return output;
    }

    let states: BTreeSet<&str> = rows.iter().map(|r| r.state.as_str()).collect();
    let periods: BTreeSet<NaiveDate> = rows.iter().map(|r| r.period_start).collect();
    let skip = periods.len().saturating_sub(months.max(1));

    let _ = write!(output, "{:<8}", "month");
    for state in &states {
        let _ = write!(output, " {:>10}", truncate(state, 10));
    }
    let _ = writeln!(output);

    for period in periods.iter().skip(skip) {
        let _ = write!(output, "{:<8}", period.format("%Y-%m"));
        for state in &states {
            let cell = rows
                .iter()
                .find(|r| r.state == *state && r.period_start == *period)
                .map(|r| r.daily.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = write!(output, " {:>10}", cell);
        }
        let _ = writeln!(output);
    }
    output
}

fn regular_table(rows: &[RegularRatio]) -> String {
    let mut output = String::new();
    if rows.is_empty() {
        let _ = writeln!(output, "No donations recorded.");
        return output;
    }
    for row in rows {
        let _ = writeln!(
            output,
            "- {} {}: {} regular of {} classified donations",
            row.state,
            row.period_start.format("%Y"),
            pct(row.percentage_regular),
            row.total
        );
    }
    output
}

fn turnout_table(report: &RetentionReport) -> String {
    let mut output = String::new();
    if report.yearly_turnout.is_empty() {
        let _ = writeln!(output, "No merged donor rows for this scope.");
        return output;
    }
    for row in &report.yearly_turnout {
        let donors = row
            .distinct_donors
            .map(|d| d.to_string())
            .unwrap_or_else(|| UNDEFINED.to_string());
        let _ = writeln!(
            output,
            "- {}: {} ({} donors / {} donations, {} days matched)",
            row.year,
            pct(row.percentage),
            donors,
            row.total_donations,
            row.matched_days
        );
    }
    output
}

fn cohort_table(report: &RetentionReport) -> String {
    let mut output = String::new();
    let retention = &report.cohort_retention;
    let Some(max_elapsed) = retention.max_elapsed() else {
        let _ = writeln!(output, "No granular visits recorded.");
        return output;
    };

    let _ = write!(output, "{:<6} {:>7}", "cohort", "donors");
    for elapsed in 0..=max_elapsed {
        let _ = write!(output, " {:>7}", format!("+{}y", elapsed));
    }
    let _ = writeln!(output);

    for cohort in retention.cohort_years() {
        let size = report.cohort_matrix.cohort_size(cohort).unwrap_or(0);
        let _ = write!(output, "{:<6} {:>7}", cohort, size);
        for elapsed in 0..=max_elapsed {
            let _ = write!(output, " {:>7}", fraction_pct(retention.rate(cohort, elapsed)));
        }
        let _ = writeln!(output);
    }
    output
}

fn age_group_table(report: &RetentionReport) -> String {
    let mut output = String::new();
    let table = &report.age_group;
    if table.years.is_empty() {
        let _ = writeln!(output, "No new-donor rows for this scope.");
        return output;
    }

    let _ = write!(output, "{:<6}", "year");
    for bucket in &table.buckets {
        let _ = write!(output, " {:>7}", bucket);
    }
    let _ = writeln!(output);

    for &year in &table.years {
        let _ = write!(output, "{:<6}", year);
        for bucket in &table.buckets {
            let _ = write!(output, " {:>7}", fraction_pct(table.rate(year, bucket)));
        }
        let _ = writeln!(output);
    }
    output
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}
