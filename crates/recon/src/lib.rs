//! `rosterjoin-recon` — Player roster reconciliation engine.
//!
//! Joins two player datasets whose names and team labels disagree: team
//! labels are canonicalized, names are fuzzy-matched within a team, and the
//! accepted pairs are inner-joined into one table.
//!
//! Pure engine crate apart from text parsing: callers hand in CSV/JSON text
//! or pre-built datasets and get results back. File IO lives in the CLI.

pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod similarity;
pub mod teams;

pub use config::ReconConfig;
pub use engine::{load_dataset, pipeline, run};
pub use error::ReconError;
pub use matcher::{match_players, MatchOptions};
pub use merge::merge;
pub use model::{Dataset, MatchTable, MergedTable, PlayerRecord, ReconInput, ReconResult};
pub use similarity::score;
pub use teams::TeamNormalizer;
