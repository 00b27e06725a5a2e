//! `gridiron-recon`: football game-result reconciliation engine.
//!
//! Pure engine crate: receives two sources' pre-loaded observations and
//! read-only reference lookups, returns the classification and the new
//! canonical games. Persistence goes through the `sink` traits.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod policy;
pub mod reconcile;
pub mod resolver;
pub mod season;
pub mod sink;
pub mod summary;
pub mod week;

pub use config::RunConfig;
pub use engine::{run, RunInput};
pub use error::ReconError;
pub use model::{CanonicalGame, GameKey, Observation, ReconResult};
pub use week::Week;
