//! Result source interface and implementations
//!
//! A result source supplies a finite, ordered batch of completed games.
//! Transport and parsing belong to the source; failures surface as
//! `SourceUnavailable` so the caller can leave its ratings untouched.

use crate::error::{LeagueError, Result};
use crate::types::GameResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Trait for supplying game results
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultSource: Send + Sync {
    /// Fetch the current batch of completed games in chronological order
    async fn fetch_results(&self) -> Result<Vec<GameResult>>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Source backed by a fixed list of results
#[derive(Debug, Clone, Default)]
pub struct StaticResultSource {
    results: Vec<GameResult>,
}

impl StaticResultSource {
    pub fn new(results: Vec<GameResult>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl ResultSource for StaticResultSource {
    async fn fetch_results(&self) -> Result<Vec<GameResult>> {
        Ok(self.results.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} results)", self.results.len())
    }
}

/// Source reading a JSON array of results from disk
#[derive(Debug, Clone)]
pub struct JsonFileResultSource {
    path: PathBuf,
}

impl JsonFileResultSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSource for JsonFileResultSource {
    async fn fetch_results(&self) -> Result<Vec<GameResult>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            warn!("Failed to read results from {}: {}", self.path.display(), e);
            LeagueError::SourceUnavailable {
                message: format!("Failed to read {}: {}", self.path.display(), e),
            }
        })?;

        let results: Vec<GameResult> = serde_json::from_str(&raw).map_err(|e| {
            warn!("Malformed results file {}: {}", self.path.display(), e);
            LeagueError::SourceUnavailable {
                message: format!("Malformed results in {}: {}", self.path.display(), e),
            }
        })?;

        debug!("Read {} results from {}", results.len(), self.path.display());
        Ok(results)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
