//! League storage interface and implementations
//!
//! This module defines the persistence boundary of the rating engine: load
//! returns the starting ratings, display names and any previously saved
//! state; save accepts the current state. Both in-memory and JSON file
//! implementations are provided.

use crate::error::{LeagueError, Result};
use crate::types::{LeagueSnapshot, LeagueState, TeamId};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::{debug, info};

/// Starting ratings, `{team_id: rating}`
pub const INITIAL_RATINGS_FILE: &str = "initial_ratings.json";

/// Display names, `{team_id: name}`
pub const TEAM_MAPPING_FILE: &str = "team_mapping.json";

/// Saved ratings, parameters and game log
pub const STATE_FILE: &str = "league_state.json";

/// Trait for league persistence operations
pub trait LeagueStore: Send + Sync {
    /// Load the starting data and the last saved state, if any
    fn load(&self) -> Result<LeagueSnapshot>;

    /// Durably store the current state
    fn save(&self, state: &LeagueState) -> Result<()>;

    /// Short description for logs
    fn describe(&self) -> String;
}

fn lock_error(what: &str) -> anyhow::Error {
    LeagueError::InternalError {
        message: format!("Failed to acquire {} lock", what),
    }
    .into()
}

/// In-memory league storage implementation
#[derive(Debug, Default)]
pub struct InMemoryLeagueStore {
    snapshot: RwLock<LeagueSnapshot>,
}

impl InMemoryLeagueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding starting ratings and names but no saved state
    pub fn with_seed(
        initial_ratings: HashMap<TeamId, f64>,
        team_names: HashMap<TeamId, String>,
    ) -> Self {
        Self {
            snapshot: RwLock::new(LeagueSnapshot {
                initial_ratings,
                team_names,
                state: None,
            }),
        }
    }

    /// The most recently saved state
    pub fn saved_state(&self) -> Option<LeagueState> {
        self.snapshot
            .read()
            .ok()
            .and_then(|snapshot| snapshot.state.clone())
    }
}

impl LeagueStore for InMemoryLeagueStore {
    fn load(&self) -> Result<LeagueSnapshot> {
        let snapshot = self.snapshot.read().map_err(|_| lock_error("snapshot read"))?;
        Ok(snapshot.clone())
    }

    fn save(&self, state: &LeagueState) -> Result<()> {
        let mut snapshot = self
            .snapshot
            .write()
            .map_err(|_| lock_error("snapshot write"))?;
        snapshot.state = Some(state.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

/// JSON file storage rooted at a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write starting ratings and display names into the data directory
    pub fn write_seed(
        &self,
        initial_ratings: &HashMap<TeamId, f64>,
        team_names: &HashMap<TeamId, String>,
    ) -> Result<()> {
        self.ensure_dir()?;
        self.write_json(INITIAL_RATINGS_FILE, initial_ratings)?;
        self.write_json(TEAM_MAPPING_FILE, team_names)?;
        Ok(())
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            LeagueError::PersistenceFailure {
                message: format!(
                    "Failed to create data directory {}: {}",
                    self.data_dir.display(),
                    e
                ),
            }
            .into()
        })
    }

    /// Read a file that may legitimately be absent
    fn read_optional<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.data_dir.join(name);
        if !path.exists() {
            debug!("{} not found, using defaults", path.display());
            return Ok(T::default());
        }

        let raw = fs::read_to_string(&path).map_err(|e| LeagueError::PersistenceFailure {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            LeagueError::PersistenceFailure {
                message: format!("Malformed {}: {}", path.display(), e),
            }
            .into()
        })
    }

    /// Write through a temporary file so readers never see a partial document
    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.data_dir.join(name);
        let tmp_path = self.data_dir.join(format!("{}.tmp", name));

        let body = serde_json::to_string_pretty(value).map_err(|e| {
            LeagueError::PersistenceFailure {
                message: format!("Failed to serialize {}: {}", name, e),
            }
        })?;

        fs::write(&tmp_path, body).map_err(|e| LeagueError::PersistenceFailure {
            message: format!("Failed to write {}: {}", tmp_path.display(), e),
        })?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            LeagueError::PersistenceFailure {
                message: format!("Failed to replace {}: {}", path.display(), e),
            }
            .into()
        })
    }
}

impl LeagueStore for JsonFileStore {
    fn load(&self) -> Result<LeagueSnapshot> {
        let initial_ratings: HashMap<TeamId, f64> = self.read_optional(INITIAL_RATINGS_FILE)?;
        let team_names: HashMap<TeamId, String> = self.read_optional(TEAM_MAPPING_FILE)?;
        let state: Option<LeagueState> = self.read_optional(STATE_FILE)?;

        info!(
            "Loaded league data from {}: {} initial ratings, {} names, {} logged games",
            self.data_dir.display(),
            initial_ratings.len(),
            team_names.len(),
            state.as_ref().map(|s| s.games.len()).unwrap_or(0)
        );

        Ok(LeagueSnapshot {
            initial_ratings,
            team_names,
            state,
        })
    }

    fn save(&self, state: &LeagueState) -> Result<()> {
        self.ensure_dir()?;
        self.write_json(STATE_FILE, state)?;
        debug!(
            "Saved {} ratings and {} games to {}",
            state.ratings.len(),
            state.games.len(),
            self.data_dir.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.data_dir.display())
    }
}

/// Mock league storage for testing
#[derive(Debug, Default)]
pub struct MockLeagueStore {
    snapshot: RwLock<LeagueSnapshot>,
    save_calls: RwLock<Vec<LeagueState>>,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

impl MockLeagueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset the data returned by `load`
    pub fn preset_snapshot(&self, snapshot: LeagueSnapshot) -> Result<()> {
        let mut current = self
            .snapshot
            .write()
            .map_err(|_| lock_error("snapshot write"))?;
        *current = snapshot;
        Ok(())
    }

    /// Make subsequent saves fail with `PersistenceFailure`
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent loads fail with `PersistenceFailure`
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Get all successful save calls made (for testing)
    pub fn get_save_calls(&self) -> Vec<LeagueState> {
        self.save_calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl LeagueStore for MockLeagueStore {
    fn load(&self) -> Result<LeagueSnapshot> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(LeagueError::PersistenceFailure {
                message: "mock load failure".to_string(),
            }
            .into());
        }

        let snapshot = self.snapshot.read().map_err(|_| lock_error("snapshot read"))?;
        Ok(snapshot.clone())
    }

    fn save(&self, state: &LeagueState) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(LeagueError::PersistenceFailure {
                message: "mock save failure".to_string(),
            }
            .into());
        }

        if let Ok(mut calls) = self.save_calls.write() {
            calls.push(state.clone());
        }

        let mut snapshot = self
            .snapshot
            .write()
            .map_err(|_| lock_error("snapshot write"))?;
        snapshot.state = Some(state.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
