//! Test fixtures shared by the integration tests
#![allow(dead_code)]

use league_ratings::metrics::MetricsCollector;
use league_ratings::rating::EngineParameters;
use league_ratings::utils::approx_eq;
use league_ratings::{GameResult, JsonFileStore, LeagueService};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Starting ratings for a small five-team league
pub fn initial_ratings() -> HashMap<String, f64> {
    HashMap::from([
        ("SYD".to_string(), 3.5),
        ("MEL".to_string(), 2.0),
        ("PER".to_string(), 0.5),
        ("ADL".to_string(), -2.5),
        ("BRI".to_string(), -3.5),
    ])
}

pub fn team_names() -> HashMap<String, String> {
    HashMap::from([
        ("SYD".to_string(), "Sydney Kings".to_string()),
        ("MEL".to_string(), "Melbourne United".to_string()),
        ("PER".to_string(), "Perth Wildcats".to_string()),
        ("ADL".to_string(), "Adelaide 36ers".to_string()),
        ("BRI".to_string(), "Brisbane Bullets".to_string()),
    ])
}

/// A short season, partly keyed by display name as a fetched feed would be
pub fn season_results() -> Vec<GameResult> {
    vec![
        GameResult::new("SYD", "MEL", 92, 88),
        GameResult::new("Perth Wildcats", "Adelaide 36ers", 101, 79),
        GameResult::new("BRI", "SYD", 84, 96),
        GameResult::new("MEL", "PER", 90, 91),
        GameResult::new("adelaide 36ers", "BRI", 77, 70),
        GameResult::new("SYD", "PER", 85, 85),
    ]
}

/// Data directory seeded with the fixture league
pub struct SeededLeague {
    pub dir: TempDir,
}

impl SeededLeague {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        JsonFileStore::new(dir.path())
            .write_seed(&initial_ratings(), &team_names())
            .expect("Failed to write seed");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn open(&self) -> LeagueService {
        self.open_with(EngineParameters::default())
    }

    pub fn open_with(&self, parameters: EngineParameters) -> LeagueService {
        let store = Arc::new(JsonFileStore::new(self.path()));
        let metrics = Arc::new(MetricsCollector::new().expect("Failed to create collector"));
        LeagueService::open(store, parameters, metrics).expect("Failed to open league")
    }

    /// Write `results` as a results file inside the data directory
    pub fn write_results(&self, name: &str, results: &[GameResult]) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(results).unwrap())
            .expect("Failed to write results file");
        path
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        approx_eq(actual, expected, 1e-9),
        "expected {expected}, got {actual}"
    );
}
