use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::DataSource;
use crate::week::{cache_file_name, Week};

/// Earliest season on record.
pub const MIN_SEASON: i32 = 1869;
pub const MAX_SEASON: i32 = 2200;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub name: String,
    /// Season start year.
    pub season: i32,
    pub week: Week,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub store: Option<StoreConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Source A. Authoritative for overtimes and orientation.
    pub left: SourceConfig,
    /// Source B. Authoritative for neutral site.
    pub right: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub data_source: String,
    /// Explicit CSV path. Takes precedence over `cache_prefix`.
    #[serde(default)]
    pub file: Option<String>,
    /// Derive the file name as `<prefix>-<season>-<week>.csv`.
    #[serde(default)]
    pub cache_prefix: Option<String>,
    #[serde(default)]
    pub columns: ColumnMapping,
}

impl SourceConfig {
    pub fn data_source(&self) -> DataSource {
        DataSource::new(self.data_source.as_str())
    }

    pub fn input_file(&self, season: i32, week: Week) -> Option<String> {
        self.file
            .clone()
            .or_else(|| self.cache_prefix.as_deref().map(|p| cache_file_name(p, season, week)))
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// CSV header names. Optional fields are skipped when the header is absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub date: String,
    pub home: String,
    pub away: String,
    pub home_points: String,
    pub away_points: String,
    pub neutral_site: Option<String>,
    pub overtimes: Option<String>,
    pub comments: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            date: "Date".into(),
            home: "Home".into(),
            away: "Away".into(),
            home_points: "HomePoints".into(),
            away_points: "AwayPoints".into(),
            neutral_site: Some("NeutralSite".into()),
            overtimes: Some("Overtimes".into()),
            comments: Some("Comments".into()),
        }
    }
}

impl ColumnMapping {
    fn names(&self) -> impl Iterator<Item = &str> {
        [&self.date, &self.home, &self.away, &self.home_points, &self.away_points]
            .into_iter()
            .map(String::as_str)
            .chain(
                [&self.neutral_site, &self.overtimes, &self.comments]
                    .into_iter()
                    .filter_map(|c| c.as_deref()),
            )
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    #[default]
    Skip,
    PreferLeft,
    PreferRight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    #[default]
    Skip,
    Accept,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub on_conflict: ConflictPolicy,
    pub unmatched_left: UnmatchedPolicy,
    pub unmatched_right: UnmatchedPolicy,
    pub comment_separator: String,
    /// data source -> raw name -> team id
    pub aliases: BTreeMap<String, BTreeMap<String, i64>>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            on_conflict: ConflictPolicy::Skip,
            unmatched_left: UnmatchedPolicy::Skip,
            unmatched_right: UnmatchedPolicy::Skip,
            comment_separator: "; ".into(),
            aliases: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !(MIN_SEASON..=MAX_SEASON).contains(&self.season) {
            return Err(ReconError::ConfigValidation(format!(
                "season must be between {MIN_SEASON} and {MAX_SEASON}, got {}",
                self.season
            )));
        }

        for (side, source) in [("left", &self.sources.left), ("right", &self.sources.right)] {
            if source.data_source.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "sources.{side}: data_source is empty"
                )));
            }
            if source.file.is_none() && source.cache_prefix.is_none() {
                return Err(ReconError::ConfigValidation(format!(
                    "sources.{side}: set either file or cache_prefix"
                )));
            }
            if source.columns.names().any(|c| c.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "sources.{side}: column names must not be empty"
                )));
            }
        }

        if self.sources.left.data_source == self.sources.right.data_source {
            return Err(ReconError::ConfigValidation(format!(
                "left and right sources are both '{}'",
                self.sources.left.data_source
            )));
        }

        if self.policy.comment_separator.is_empty() {
            return Err(ReconError::ConfigValidation(
                "policy.comment_separator must not be empty".into(),
            ));
        }

        for (source, names) in &self.policy.aliases {
            for (name, &team) in names {
                if team <= 0 {
                    return Err(ReconError::ConfigValidation(format!(
                        "policy.aliases.'{source}': '{name}' maps to non-positive team id {team}"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
