// Pipeline stages: load raw tables, then compute every output table from them.
use crate::analyzer::age_group::{
    age_group_retention, merge_donor_records, yearly_totals, AgeGroupRetention,
};
use crate::analyzer::aggregation::{aggregate, only_state, without_state, Period, PeriodAggregate};
use crate::analyzer::alignment::{align, summarize_visits, yearly_turnout, YearlyTurnout};
use crate::analyzer::cohort::{distinct_donors_per_year, CohortMatrix, RetentionMatrix};
use crate::analyzer::regular_ratio::{regular_ratios, RegularRatio};
use crate::config::{AnalysisConfig, SourcesConfig};
use crate::loader::{parse_donations, parse_granular, parse_new_donors, RecordSource};
use crate::model::{DonationRecord, GranularVisit, LoadError, NewDonorRecord};
use tracing::{debug, info, warn};

/// Output of the load stage: the three typed input tables.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub donations: Vec<DonationRecord>,
    pub new_donors: Vec<NewDonorRecord>,
    pub visits: Vec<GranularVisit>,
}

/// Output of the compute stage, handed as-is to rendering and delivery.
#[derive(Debug, Clone)]
pub struct RetentionReport {
    pub monthly_by_state: Vec<PeriodAggregate>,
    pub monthly_national: Vec<PeriodAggregate>,
    pub yearly_regular_all: Vec<RegularRatio>,
    pub yearly_regular_national: Vec<RegularRatio>,
    pub yearly_turnout: Vec<YearlyTurnout>,
    pub cohort_matrix: CohortMatrix,
    pub cohort_retention: RetentionMatrix,
    pub age_group: AgeGroupRetention,
}

/// Fetches and parses the three sources concurrently.
pub async fn load(
    source: &dyn RecordSource,
    sources: &SourcesConfig,
    age_buckets: &[String],
) -> Result<LoadedData, LoadError> {
    let (donations_raw, new_donors_raw, visits_raw) = futures::try_join!(
        source.fetch(&sources.donations_state),
        source.fetch(&sources.newdonors_state),
        source.fetch(&sources.granular),
    )?;

    let data = LoadedData {
        donations: parse_donations(&donations_raw)?,
        new_donors: parse_new_donors(&new_donors_raw, age_buckets)?,
        visits: parse_granular(visits_raw)?,
    };
    info!(
        "Loaded {} donation rows, {} new-donor rows, {} visits",
        data.donations.len(),
        data.new_donors.len(),
        data.visits.len()
    );
    Ok(data)
}

pub fn compute(data: &LoadedData, cfg: &AnalysisConfig) -> RetentionReport {
    let national = cfg.national_state.as_str();

    info!("Aggregating donations...");
    let monthly = aggregate(&data.donations, Period::Month);
    let yearly = aggregate(&data.donations, Period::Year);
    let monthly_national = only_state(&monthly, national);
    let yearly_national = only_state(&yearly, national);
    if monthly_national.is_empty() {
        warn!("No rows for national state '{}'", national);
    }

    let yearly_regular_all = regular_ratios(&without_state(&yearly, national));
    let yearly_regular_national = regular_ratios(&yearly_national);
    let undefined = yearly_regular_all
        .iter()
        .chain(&yearly_regular_national)
        .filter(|r| r.percentage_regular.is_none())
        .count();
    if undefined > 0 {
        debug!("{} yearly buckets without classified donations", undefined);
    }

    info!("Merging donor records...");
    let merged = merge_donor_records(&data.donations, &data.new_donors);
    let scoped: Vec<_> = merged.into_iter().filter(|r| r.state == national).collect();

    info!("Aligning {} rows with granular visits...", scoped.len());
    let summaries = summarize_visits(&data.visits, national);
    let aligned = align(scoped, &summaries);
    let unmatched = aligned.iter().filter(|a| !a.is_attached()).count();
    if unmatched > 0 {
        debug!("{} aggregate rows precede the first granular visit", unmatched);
    }
    let turnout = yearly_turnout(&aligned, &distinct_donors_per_year(&data.visits));

    info!("Building cohort matrix from {} visits...", data.visits.len());
    let cohort_matrix = CohortMatrix::build(&data.visits);
    let cohort_retention = cohort_matrix.retention();

    info!("Computing age-group retention ({:?})...", cfg.age_group_mode);
    let totals = yearly_totals(aligned.iter().map(|a| &a.row), &cfg.age_buckets);
    let age_group = age_group_retention(&totals, &cfg.age_buckets, cfg.age_group_mode);

    RetentionReport {
        monthly_by_state: without_state(&monthly, national),
        monthly_national,
        yearly_regular_all,
        yearly_regular_national,
        yearly_turnout: turnout,
        cohort_matrix,
        cohort_retention,
        age_group,
    }
}
