// Analyzer module: the retention engine, one submodule per calculation.

pub mod aggregation;
pub mod regular_ratio;
pub mod alignment;
pub mod cohort;
pub mod age_group;

pub use aggregation::{aggregate, Period, PeriodAggregate};
pub use age_group::{AgeGroupMode, AgeGroupRetention};
pub use alignment::{align, Aligned, GranularSummary, YearlyTurnout};
pub use cohort::{CohortMatrix, RetentionMatrix};
pub use regular_ratio::RegularRatio;
