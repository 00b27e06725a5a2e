use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Canonical team identity. Many source spellings map to one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonId(pub i64);

/// Data provider tag, e.g. `espn.com` or `ncaa.org`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSource(String);

impl DataSource {
    /// Sports network scoreboard. Reports overtimes.
    pub const ESPN: &'static str = "espn.com";
    /// Governing-body stats site. Reports neutral sites.
    pub const NCAA: &'static str = "ncaa.org";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DataSource {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One game as a single source reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub source: DataSource,
    /// Season start year.
    pub season: i32,
    pub date: NaiveDate,
    pub home_name: String,
    pub away_name: String,
    /// `None` when the game is not final.
    pub home_points: Option<u32>,
    pub away_points: Option<u32>,
    /// `None` when the source does not report venue.
    pub neutral_site: Option<bool>,
    pub overtimes: Option<u32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Position of an observation in its input batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObservationRef {
    pub side: Side,
    pub index: usize,
}

impl fmt::Display for ObservationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.side, self.index)
    }
}

/// An observation with team and season ids attached.
/// A `None` team means the raw name is not in the source-name table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedObservation {
    pub id: ObservationRef,
    pub observation: Observation,
    pub home_team: Option<TeamId>,
    pub away_team: Option<TeamId>,
    pub season_id: SeasonId,
}

impl ResolvedObservation {
    pub fn is_resolved(&self) -> bool {
        self.home_team.is_some() && self.away_team.is_some()
    }

    /// Direct join key. `None` while either team is unresolved.
    pub fn key(&self) -> Option<GameKey> {
        Some(GameKey {
            date: self.observation.date,
            home: self.home_team?,
            away: self.away_team?,
        })
    }

    pub fn is_neutral(&self) -> bool {
        self.observation.neutral_site == Some(true)
    }

    pub fn points(&self) -> (Option<u32>, Option<u32>) {
        (self.observation.home_points, self.observation.away_points)
    }
}

/// Persisted dedup key of a canonical game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameKey {
    pub date: NaiveDate,
    pub home: TeamId,
    pub away: TeamId,
}

impl GameKey {
    pub fn reversed(&self) -> Self {
        Self {
            date: self.date,
            home: self.away,
            away: self.home,
        }
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}@{}", self.date, self.away, self.home)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Two observations of the same game. `key` is the left observation's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidatePair {
    pub key: GameKey,
    pub left: ResolvedObservation,
    pub right: ResolvedObservation,
    /// Right's home team is left's away team.
    pub reversed: bool,
}

impl CandidatePair {
    /// Right scores as (home, away) in the left observation's orientation.
    pub fn right_points_oriented(&self) -> (Option<u32>, Option<u32>) {
        let (home, away) = self.right.points();
        if self.reversed {
            (away, home)
        } else {
            (home, away)
        }
    }

    /// Same pair with the source designations exchanged.
    pub fn swapped(&self) -> Self {
        let key = if self.reversed { self.key.reversed() } else { self.key };
        Self {
            key,
            left: self.right.clone(),
            right: self.left.clone(),
            reversed: self.reversed,
        }
    }
}

/// One candidate edge inside a multiply-matched group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CandidateLink {
    pub left: ObservationRef,
    pub right: ObservationRef,
    pub reversed: bool,
}

/// Observations whose candidates overlap. Never auto-matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousGroup {
    pub left: Vec<ResolvedObservation>,
    pub right: Vec<ResolvedObservation>,
    pub links: Vec<CandidateLink>,
}

impl AmbiguousGroup {
    pub fn observation_count(&self) -> usize {
        self.left.len() + self.right.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchOutput {
    pub pairs: Vec<CandidatePair>,
    pub multiply_matched: Vec<AmbiguousGroup>,
    pub unmatched_left: Vec<ResolvedObservation>,
    pub unmatched_right: Vec<ResolvedObservation>,
    pub unknown_left: Vec<ResolvedObservation>,
    pub unknown_right: Vec<ResolvedObservation>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Consistent,
    Conflicting,
    MultiplyMatched,
    UnmatchedLeft,
    UnmatchedRight,
    UnknownTeam,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consistent => write!(f, "consistent"),
            Self::Conflicting => write!(f, "conflicting"),
            Self::MultiplyMatched => write!(f, "multiply_matched"),
            Self::UnmatchedLeft => write!(f, "unmatched_left"),
            Self::UnmatchedRight => write!(f, "unmatched_right"),
            Self::UnknownTeam => write!(f, "unknown_team"),
        }
    }
}

/// A raw name no source-name entry covers, with every observation using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownName {
    pub source: DataSource,
    pub raw_name: String,
    pub observations: Vec<ObservationRef>,
}

/// Every observation of a run, each in exactly one bucket.
/// `unknown_names` is a view over the unknown buckets, not a bucket itself.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub consistent: Vec<CandidatePair>,
    pub conflicting: Vec<CandidatePair>,
    pub multiply_matched: Vec<AmbiguousGroup>,
    pub unmatched_left: Vec<ResolvedObservation>,
    pub unmatched_right: Vec<ResolvedObservation>,
    pub unknown_left: Vec<ResolvedObservation>,
    pub unknown_right: Vec<ResolvedObservation>,
    pub unknown_names: Vec<UnknownName>,
}

// ---------------------------------------------------------------------------
// Canonical output
// ---------------------------------------------------------------------------

/// Final score. Ties are a valid outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub home_points: u32,
    pub away_points: u32,
    pub overtimes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalGame {
    pub date: NaiveDate,
    pub season_id: SeasonId,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub neutral_site: bool,
    pub comments: Option<String>,
    pub result: Option<GameResult>,
}

impl CanonicalGame {
    pub fn key(&self) -> GameKey {
        GameKey {
            date: self.date,
            home: self.home_team,
            away: self.away_team,
        }
    }

    /// Canonical game built from one source alone. `None` if a team is unresolved.
    pub fn from_observation(obs: &ResolvedObservation) -> Option<Self> {
        let key = obs.key()?;
        let o = &obs.observation;
        let result = match (o.home_points, o.away_points) {
            (Some(home_points), Some(away_points)) => Some(GameResult {
                home_points,
                away_points,
                overtimes: o.overtimes.unwrap_or(0),
            }),
            _ => None,
        };
        Some(Self {
            date: key.date,
            season_id: obs.season_id,
            home_team: key.home,
            away_team: key.away,
            neutral_site: obs.is_neutral(),
            comments: o.comment.clone().filter(|c| !c.trim().is_empty()),
            result,
        })
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_observations: usize,
    pub consistent: usize,
    pub conflicting: usize,
    pub multiply_matched_groups: usize,
    pub multiply_matched_observations: usize,
    pub unmatched_left: usize,
    pub unmatched_right: usize,
    pub unknown_left: usize,
    pub unknown_right: usize,
    pub unknown_names: usize,
    pub bucket_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    /// Multiply-matched groups left for manual resolution.
    pub ambiguous: usize,
    /// Observations held back by an unknown team.
    pub unresolved: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation {
    pub games: Vec<CanonicalGame>,
    pub duplicates: Vec<GameKey>,
    pub summary: ReconcileSummary,
}

/// A source-name mapping learned during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceNameEntry {
    pub source: DataSource,
    pub name: String,
    pub team: TeamId,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub season: i32,
    pub week: String,
    pub left_source: DataSource,
    pub right_source: DataSource,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: RunMeta,
    pub summary: ReportSummary,
    pub classification: Classification,
    pub reconciliation: Reconciliation,
    pub learned_names: Vec<SourceNameEntry>,
}
