//! League Ratings - margin-of-victory team ratings for sports leagues
//!
//! This crate maintains a zero-sum rating per team, updated after every
//! completed game from the gap between the actual and expected margin, with
//! an audit log, standings, win predictions, persistence and an HTTP API.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod source;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LeagueError, Result};
pub use types::*;

// Re-export key components
pub use rating::{EngineParameters, JsonFileStore, LeagueStore, RatingEngine};
pub use service::LeagueService;
pub use source::{JsonFileResultSource, ResultSource, StaticResultSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
