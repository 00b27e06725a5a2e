//! Storage-facing seams: the existing-game lookup the reconciler consults
//! and the append operation that persists its output.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::convert::Infallible;

use serde::Serialize;

use crate::model::{CanonicalGame, GameKey};

/// Key-value lookup over already persisted games.
pub trait ExistingGames {
    fn game_exists(&self, key: &GameKey) -> bool;
}

impl ExistingGames for HashSet<GameKey> {
    fn game_exists(&self, key: &GameKey) -> bool {
        self.contains(key)
    }
}

impl ExistingGames for BTreeSet<GameKey> {
    fn game_exists(&self, key: &GameKey) -> bool {
        self.contains(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    /// The unique (date, home, away) key was taken between the dedup check
    /// and the insert.
    DuplicateKey,
}

pub trait GameSink {
    type Error: std::error::Error;

    fn append(&mut self, game: &CanonicalGame) -> Result<AppendOutcome, Self::Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistSummary {
    pub inserted: usize,
    pub integrity_skips: usize,
    pub skipped_keys: Vec<GameKey>,
}

/// Append every game. A duplicate key at insert time is counted, not fatal.
pub fn persist<S>(games: &[CanonicalGame], sink: &mut S) -> Result<PersistSummary, S::Error>
where
    S: GameSink + ?Sized,
{
    let mut summary = PersistSummary::default();
    for game in games {
        match sink.append(game)? {
            AppendOutcome::Inserted => summary.inserted += 1,
            AppendOutcome::DuplicateKey => {
                log::warn!("game {} was inserted concurrently, skipping", game.key());
                summary.integrity_skips += 1;
                summary.skipped_keys.push(game.key());
            }
        }
    }
    log::info!(
        "persisted {} games ({} integrity skips)",
        summary.inserted,
        summary.integrity_skips
    );
    Ok(summary)
}

/// In-memory game store. Serves as both lookup and sink.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    games: BTreeMap<GameKey, CanonicalGame>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn get(&self, key: &GameKey) -> Option<&CanonicalGame> {
        self.games.get(key)
    }
}

impl ExistingGames for MemoryStore {
    fn game_exists(&self, key: &GameKey) -> bool {
        self.games.contains_key(key)
    }
}

impl GameSink for MemoryStore {
    type Error = Infallible;

    fn append(&mut self, game: &CanonicalGame) -> Result<AppendOutcome, Infallible> {
        let key = game.key();
        if self.games.contains_key(&key) {
            return Ok(AppendOutcome::DuplicateKey);
        }
        self.games.insert(key, game.clone());
        Ok(AppendOutcome::Inserted)
    }
}
