//! Margin-of-victory rating system
//!
//! This module provides the update rule, the stateful rating engine and
//! the storage interfaces the engine is persisted through.

pub mod engine;
pub mod margin;
pub mod storage;

// Re-export commonly used types
pub use engine::{RatingEngine, DEFAULT_RATING};
pub use margin::{margin_to_probability, EngineParameters, PROBABILITY_SCALE};
pub use storage::{InMemoryLeagueStore, JsonFileStore, LeagueStore, MockLeagueStore};
