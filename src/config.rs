use crate::analyzer::age_group::{AgeGroupMode, DEFAULT_AGE_BUCKETS};
use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DONATIONS_STATE_URL: &str =
    "https://raw.githubusercontent.com/MoH-Malaysia/data-darah-public/main/donations_state.csv";
pub const NEWDONORS_STATE_URL: &str =
    "https://raw.githubusercontent.com/MoH-Malaysia/data-darah-public/main/newdonors_state.csv";
/// Short link to the anonymised per-visit parquet dump.
pub const GRANULAR_URL: &str = "https://dub.sh/ds-data-granular";

/// Where each of the three input tables is read from (URL or local path).
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_donations_state")]
    pub donations_state: String,
    #[serde(default = "default_newdonors_state")]
    pub newdonors_state: String,
    #[serde(default = "default_granular")]
    pub granular: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            donations_state: default_donations_state(),
            newdonors_state: default_newdonors_state(),
            granular: default_granular(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// State value of the nationwide aggregate rows.
    #[serde(default = "default_national_state")]
    pub national_state: String,
    #[serde(default)]
    pub age_group_mode: AgeGroupMode,
    #[serde(default = "default_age_buckets")]
    pub age_buckets: Vec<String>,
    /// Number of most recent months shown in the monthly trend sections.
    #[serde(default = "default_report_months")]
    pub report_months: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            national_state: default_national_state(),
            age_group_mode: AgeGroupMode::default(),
            age_buckets: default_age_buckets(),
            report_months: default_report_months(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub telegram_chat_id: Option<i64>,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn default_donations_state() -> String {
    DONATIONS_STATE_URL.to_string()
}

fn default_newdonors_state() -> String {
    NEWDONORS_STATE_URL.to_string()
}

fn default_granular() -> String {
    GRANULAR_URL.to_string()
}

fn default_national_state() -> String {
    "Malaysia".to_string()
}

fn default_age_buckets() -> Vec<String> {
    DEFAULT_AGE_BUCKETS.iter().map(|s| s.to_string()).collect()
}

fn default_report_months() -> usize {
    12
}

/// Reads `path` if it exists, otherwise starts from defaults.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    if !Path::new(path).exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    Ok(config)
}

/// Applies `TELEGRAM_TOKEN` / `TELEGRAM_GROUP_ID` on top of the file values.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup("TELEGRAM_TOKEN").filter(|t| !t.trim().is_empty()) {
        config.telegram_bot_token = Some(token.trim().to_string());
    }
    if let Some(raw) = lookup("TELEGRAM_GROUP_ID").filter(|v| !v.trim().is_empty()) {
        let chat_id = raw.trim().parse::<i64>().map_err(|_| ConfigError::InvalidEnv {
            name: "TELEGRAM_GROUP_ID".to_string(),
            value: raw.clone(),
        })?;
        config.telegram_chat_id = Some(chat_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = parse_config("{}").unwrap();
        assert_eq!(cfg.sources.donations_state, DONATIONS_STATE_URL);
        assert_eq!(cfg.sources.granular, "https://dub.sh/ds-data-granular");
        assert_eq!(cfg.analysis.national_state, "Malaysia");
        assert_eq!(cfg.analysis.age_group_mode, AgeGroupMode::YearOverYear);
        assert_eq!(cfg.analysis.age_buckets.len(), DEFAULT_AGE_BUCKETS.len());
        assert_eq!(cfg.analysis.report_months, 12);
        assert!(cfg.telegram_bot_token.is_none());
    }

    #[test]
    fn reads_explicit_values() {
        let cfg = parse_config(
            r#"{
                "telegram_bot_token": "abc",
                "telegram_chat_id": -100123,
                "sources": { "granular": "/tmp/visits.csv" },
                "analysis": {
                    "national_state": "Nationwide",
                    "age_group_mode": "ratio_to_total",
                    "age_buckets": ["17-24", "25-29"],
                    "report_months": 6
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.telegram_bot_token.as_deref(), Some("abc"));
        assert_eq!(cfg.telegram_chat_id, Some(-100123));
        assert_eq!(cfg.sources.granular, "/tmp/visits.csv");
        assert_eq!(cfg.sources.newdonors_state, NEWDONORS_STATE_URL);
        assert_eq!(cfg.analysis.age_group_mode, AgeGroupMode::RatioToTotal);
        assert_eq!(cfg.analysis.age_buckets, vec!["17-24", "25-29"]);
        assert_eq!(cfg.analysis.report_months, 6);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = parse_config(r#"{ "analysis": { "age_group_mode": "shift" } }"#);
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_overrides_telegram_settings() {
        let env: HashMap<&str, &str> =
            HashMap::from([("TELEGRAM_TOKEN", "tok"), ("TELEGRAM_GROUP_ID", "-42")]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.telegram_bot_token.as_deref(), Some("tok"));
        assert_eq!(cfg.telegram_chat_id, Some(-42));
    }

    #[test]
    fn bad_group_id_is_an_error() {
        let mut cfg = AppConfig::default();
        let err = apply_env_overrides(&mut cfg, |k| {
            (k == "TELEGRAM_GROUP_ID").then(|| "group".to_string())
        });
        assert!(matches!(err, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_config("definitely/not/here/config.json").unwrap();
        assert_eq!(cfg.analysis.national_state, "Malaysia");
    }
}
