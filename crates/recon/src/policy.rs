//! Resolution policies: the capability the engine calls when it needs a
//! decision it will not make on its own.

use crate::config::{ConflictPolicy, PolicyConfig, UnmatchedPolicy};
use crate::model::{
    CandidatePair, CanonicalGame, DataSource, GameResult, ResolvedObservation, Side, TeamId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResolution {
    Result(GameResult),
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmatchedResolution {
    Game(CanonicalGame),
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownTeamResolution {
    Team(TeamId),
    /// Leave this name unresolved and move on to the next.
    Skip,
    /// Stop asking about unknown teams for the rest of the run.
    SkipAll,
}

/// Decisions the reconciler delegates. Calls are synchronous; the engine
/// waits for each answer before moving on.
pub trait ResolutionPolicy {
    /// Scores disagree after orientation. Called once per conflicting pair.
    fn resolve_conflict(&mut self, pair: &CandidatePair) -> ConflictResolution;

    /// Only one source saw this game.
    fn resolve_unmatched(&mut self, observation: &ResolvedObservation) -> UnmatchedResolution;

    /// No source-name entry covers `raw_name`.
    fn resolve_unknown_team(&mut self, source: &DataSource, raw_name: &str) -> UnknownTeamResolution;
}

/// Skips every decision. Used for report-only runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipPolicy;

impl ResolutionPolicy for SkipPolicy {
    fn resolve_conflict(&mut self, _pair: &CandidatePair) -> ConflictResolution {
        ConflictResolution::Skip
    }

    fn resolve_unmatched(&mut self, _observation: &ResolvedObservation) -> UnmatchedResolution {
        UnmatchedResolution::Skip
    }

    fn resolve_unknown_team(&mut self, _source: &DataSource, _raw_name: &str) -> UnknownTeamResolution {
        UnknownTeamResolution::SkipAll
    }
}

/// Config-driven automatic decisions.
#[derive(Debug, Clone)]
pub struct AutoPolicy {
    on_conflict: ConflictPolicy,
    unmatched_left: UnmatchedPolicy,
    unmatched_right: UnmatchedPolicy,
    aliases: Vec<(DataSource, String, TeamId)>,
}

impl AutoPolicy {
    pub fn from_config(config: &PolicyConfig) -> Self {
        let aliases = config
            .aliases
            .iter()
            .flat_map(|(source, names)| {
                names
                    .iter()
                    .map(move |(name, &team)| (DataSource::new(source.as_str()), name.clone(), TeamId(team)))
            })
            .collect();
        Self {
            on_conflict: config.on_conflict,
            unmatched_left: config.unmatched_left,
            unmatched_right: config.unmatched_right,
            aliases,
        }
    }
}

impl ResolutionPolicy for AutoPolicy {
    fn resolve_conflict(&mut self, pair: &CandidatePair) -> ConflictResolution {
        let (home, away) = match self.on_conflict {
            ConflictPolicy::Skip => return ConflictResolution::Skip,
            ConflictPolicy::PreferLeft => pair.left.points(),
            ConflictPolicy::PreferRight => pair.right_points_oriented(),
        };
        match (home, away) {
            (Some(home_points), Some(away_points)) => ConflictResolution::Result(GameResult {
                home_points,
                away_points,
                overtimes: pair.left.observation.overtimes.unwrap_or(0),
            }),
            // The preferred source has no final score to offer.
            _ => ConflictResolution::Skip,
        }
    }

    fn resolve_unmatched(&mut self, observation: &ResolvedObservation) -> UnmatchedResolution {
        let policy = match observation.id.side {
            Side::Left => self.unmatched_left,
            Side::Right => self.unmatched_right,
        };
        match (policy, CanonicalGame::from_observation(observation)) {
            (UnmatchedPolicy::Accept, Some(game)) => UnmatchedResolution::Game(game),
            _ => UnmatchedResolution::Skip,
        }
    }

    fn resolve_unknown_team(&mut self, source: &DataSource, raw_name: &str) -> UnknownTeamResolution {
        self.aliases
            .iter()
            .find(|(s, name, _)| s == source && name == raw_name)
            .map_or(UnknownTeamResolution::Skip, |&(_, _, team)| UnknownTeamResolution::Team(team))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Observation, ObservationRef, SeasonId};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn ob(side: Side, home: i64, away: i64, points: (Option<u32>, Option<u32>), overtimes: Option<u32>) -> ResolvedObservation {
        ResolvedObservation {
            id: ObservationRef { side, index: 0 },
            observation: Observation {
                source: "espn.com".into(),
                season: 2021,
                date: NaiveDate::from_ymd_opt(2021, 9, 4).unwrap(),
                home_name: "A".into(),
                away_name: "B".into(),
                home_points: points.0,
                away_points: points.1,
                neutral_site: None,
                overtimes,
                comment: Some("  ".into()),
            },
            home_team: Some(TeamId(home)),
            away_team: Some(TeamId(away)),
            season_id: SeasonId(3),
        }
    }

    fn conflicted() -> CandidatePair {
        let left = ob(Side::Left, 1, 2, (Some(21), Some(14)), Some(1));
        let right = ob(Side::Right, 2, 1, (Some(14), Some(17)), None);
        CandidatePair { key: left.key().unwrap(), left, right, reversed: true }
    }

    fn policy(on_conflict: ConflictPolicy) -> AutoPolicy {
        AutoPolicy::from_config(&PolicyConfig { on_conflict, ..PolicyConfig::default() })
    }

    #[test]
    fn prefer_left_keeps_left_scores() {
        let res = policy(ConflictPolicy::PreferLeft).resolve_conflict(&conflicted());
        assert_eq!(
            res,
            ConflictResolution::Result(GameResult { home_points: 21, away_points: 14, overtimes: 1 })
        );
    }

    #[test]
    fn prefer_right_orients_right_scores() {
        let res = policy(ConflictPolicy::PreferRight).resolve_conflict(&conflicted());
        assert_eq!(
            res,
            ConflictResolution::Result(GameResult { home_points: 17, away_points: 14, overtimes: 1 })
        );
    }

    #[test]
    fn preferred_side_without_score_skips() {
        let mut pair = conflicted();
        pair.right.observation.home_points = None;
        assert_eq!(policy(ConflictPolicy::PreferRight).resolve_conflict(&pair), ConflictResolution::Skip);
    }

    #[test]
    fn unmatched_accept_builds_single_source_game() {
        let mut p = AutoPolicy::from_config(&PolicyConfig {
            unmatched_right: UnmatchedPolicy::Accept,
            ..PolicyConfig::default()
        });
        let right = ob(Side::Right, 4, 5, (Some(10), Some(10)), None);
        match p.resolve_unmatched(&right) {
            UnmatchedResolution::Game(game) => {
                assert_eq!(game.home_team, TeamId(4));
                assert_eq!(game.result, Some(GameResult { home_points: 10, away_points: 10, overtimes: 0 }));
                assert_eq!(game.comments, None);
                assert!(!game.neutral_site);
            }
            other => panic!("expected a game, got {other:?}"),
        }
        let left = ob(Side::Left, 4, 5, (Some(10), Some(10)), None);
        assert_eq!(p.resolve_unmatched(&left), UnmatchedResolution::Skip);
    }

    #[test]
    fn aliases_answer_unknown_teams() {
        let mut aliases = BTreeMap::new();
        aliases.insert(
            "espn.com".to_string(),
            BTreeMap::from([("St. Johns".to_string(), 77_i64)]),
        );
        let mut p = AutoPolicy::from_config(&PolicyConfig { aliases, ..PolicyConfig::default() });
        assert_eq!(
            p.resolve_unknown_team(&"espn.com".into(), "St. Johns"),
            UnknownTeamResolution::Team(TeamId(77))
        );
        assert_eq!(
            p.resolve_unknown_team(&"ncaa.org".into(), "St. Johns"),
            UnknownTeamResolution::Skip
        );
    }

    #[test]
    fn skip_policy_skips() {
        let mut p = SkipPolicy;
        assert_eq!(p.resolve_conflict(&conflicted()), ConflictResolution::Skip);
        assert_eq!(p.resolve_unknown_team(&"espn.com".into(), "X"), UnknownTeamResolution::SkipAll);
    }
}
