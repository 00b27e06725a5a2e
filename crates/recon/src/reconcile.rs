use std::collections::HashMap;

use crate::model::{
    CandidatePair, CanonicalGame, Classification, GameKey, GameResult, ReconcileSummary, Reconciliation,
};
use crate::policy::{ConflictResolution, ResolutionPolicy, UnmatchedResolution};
use crate::sink::ExistingGames;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Joins the two sources' comments when both have one.
    pub comment_separator: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            comment_separator: "; ".into(),
        }
    }
}

/// Turn a classification into new canonical games.
///
/// Consistent pairs merge directly; conflicting pairs and single-source
/// observations go through `policy`. Multiply-matched groups and
/// unknown-team observations produce nothing. Every candidate game is checked
/// against `existing` (both orientations for neutral sites) and against games
/// already emitted by this call.
pub fn reconcile<P, E>(
    classification: &Classification,
    policy: &mut P,
    existing: &E,
    options: &ReconcileOptions,
) -> Reconciliation
where
    P: ResolutionPolicy + ?Sized,
    E: ExistingGames + ?Sized,
{
    let mut emitter = Emitter {
        existing,
        emitted: HashMap::new(),
        out: Reconciliation::default(),
    };

    for pair in &classification.consistent {
        let result = match pair.left.points() {
            (Some(home_points), Some(away_points)) => Some(GameResult {
                home_points,
                away_points,
                overtimes: pair.left.observation.overtimes.unwrap_or(0),
            }),
            _ => None,
        };
        emitter.emit(merge_pair(pair, result, &options.comment_separator));
    }

    for pair in &classification.conflicting {
        match policy.resolve_conflict(pair) {
            ConflictResolution::Result(result) => {
                emitter.emit(merge_pair(pair, Some(result), &options.comment_separator));
            }
            ConflictResolution::Skip => {
                log::debug!("conflict on {} skipped", pair.key);
                emitter.out.summary.skipped += 1;
            }
        }
    }

    for obs in classification.unmatched_left.iter().chain(&classification.unmatched_right) {
        match policy.resolve_unmatched(obs) {
            UnmatchedResolution::Game(game) => emitter.emit(game),
            UnmatchedResolution::Skip => emitter.out.summary.skipped += 1,
        }
    }

    let mut out = emitter.out;
    out.summary.ambiguous = classification.multiply_matched.len();
    out.summary.unresolved = classification.unknown_left.len() + classification.unknown_right.len();

    log::info!(
        "reconciled: {} new, {} duplicates, {} skipped, {} ambiguous groups, {} unresolved",
        out.summary.inserted,
        out.summary.duplicates,
        out.summary.skipped,
        out.summary.ambiguous,
        out.summary.unresolved,
    );

    out
}

/// Canonical game for a matched pair, in the left observation's orientation.
/// Venue comes from the right source, overtimes from the left.
pub fn merge_pair(pair: &CandidatePair, result: Option<GameResult>, separator: &str) -> CanonicalGame {
    let result = result.map(|r| GameResult {
        overtimes: pair.left.observation.overtimes.unwrap_or(r.overtimes),
        ..r
    });
    CanonicalGame {
        date: pair.key.date,
        season_id: pair.left.season_id,
        home_team: pair.key.home,
        away_team: pair.key.away,
        neutral_site: pair.right.observation.neutral_site.unwrap_or(false),
        comments: merge_comments(
            pair.left.observation.comment.as_deref(),
            pair.right.observation.comment.as_deref(),
            separator,
        ),
        result,
    }
}

pub fn merge_comments(left: Option<&str>, right: Option<&str>, separator: &str) -> Option<String> {
    let left = left.map(str::trim).filter(|c| !c.is_empty());
    let right = right.map(str::trim).filter(|c| !c.is_empty());
    match (left, right) {
        (Some(l), Some(r)) => Some(format!("{l}{separator}{r}")),
        (Some(c), None) | (None, Some(c)) => Some(c.to_string()),
        (None, None) => None,
    }
}

struct Emitter<'a, E: ?Sized> {
    existing: &'a E,
    /// Emitted keys and their neutral-site flag.
    emitted: HashMap<GameKey, bool>,
    out: Reconciliation,
}

impl<E: ExistingGames + ?Sized> Emitter<'_, E> {
    fn is_duplicate(&self, key: &GameKey, neutral_site: bool) -> bool {
        if self.existing.game_exists(key) || self.emitted.contains_key(key) {
            return true;
        }
        let reversed = key.reversed();
        // A neutral game on either side makes the two orientations the same game.
        match self.emitted.get(&reversed) {
            Some(&emitted_neutral) if neutral_site || emitted_neutral => return true,
            _ => {}
        }
        neutral_site && self.existing.game_exists(&reversed)
    }

    fn emit(&mut self, game: CanonicalGame) {
        let key = game.key();
        if self.is_duplicate(&key, game.neutral_site) {
            log::debug!("game {key} already exists, skipping");
            self.out.summary.duplicates += 1;
            self.out.duplicates.push(key);
            return;
        }
        self.emitted.insert(key, game.neutral_site);
        self.out.summary.inserted += 1;
        self.out.games.push(game);
    }
}
