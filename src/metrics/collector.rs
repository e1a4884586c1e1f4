//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the rating service using
//! Prometheus metrics.

use crate::types::GameRecord;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Main metrics collector for the rating service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Game-related metrics
    game_metrics: GameMetrics,

    /// League size metrics
    league_metrics: LeagueMetrics,
}

/// Game-related metrics
#[derive(Clone)]
pub struct GameMetrics {
    /// Total games recorded
    pub games_recorded_total: IntCounter,

    /// Fetched results skipped because they were already logged
    pub duplicate_games_total: IntCounter,

    /// Results rejected as invalid
    pub rejected_games_total: IntCounter,

    /// Predictions served
    pub predictions_total: IntCounter,

    /// Failures by error kind
    pub errors_total: IntCounterVec,

    /// Size of rating transfers
    pub rating_delta: Histogram,
}

/// League size metrics
#[derive(Clone)]
pub struct LeagueMetrics {
    /// Teams with a rating
    pub teams: IntGauge,

    /// Games in the log
    pub games_logged: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let game_metrics = GameMetrics::new(&registry)?;
        let league_metrics = LeagueMetrics::new(&registry)?;

        Ok(Self {
            registry,
            game_metrics,
            league_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get game metrics
    pub fn game(&self) -> &GameMetrics {
        &self.game_metrics
    }

    /// Get league metrics
    pub fn league(&self) -> &LeagueMetrics {
        &self.league_metrics
    }

    /// Record a game that was committed to the log
    pub fn record_game(&self, record: &GameRecord) {
        self.game_metrics.games_recorded_total.inc();
        self.game_metrics
            .rating_delta
            .observe(record.rating_delta.abs());
    }

    pub fn record_duplicates(&self, count: usize) {
        self.game_metrics.duplicate_games_total.inc_by(count as u64);
    }

    pub fn record_rejected(&self, count: usize) {
        self.game_metrics.rejected_games_total.inc_by(count as u64);
    }

    pub fn record_prediction(&self) {
        self.game_metrics.predictions_total.inc();
    }

    /// Count a failure under its `LeagueError` kind
    pub fn record_error(&self, kind: &str) {
        self.game_metrics
            .errors_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn update_league_size(&self, teams: usize, games: usize) {
        self.league_metrics.teams.set(teams as i64);
        self.league_metrics.games_logged.set(games as i64);
    }

    /// Encode all metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl GameMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let games_recorded_total = IntCounter::new(
            "league_ratings_games_recorded_total",
            "Total games recorded",
        )?;
        registry.register(Box::new(games_recorded_total.clone()))?;

        let duplicate_games_total = IntCounter::new(
            "league_ratings_duplicate_games_total",
            "Fetched results skipped as already recorded",
        )?;
        registry.register(Box::new(duplicate_games_total.clone()))?;

        let rejected_games_total = IntCounter::new(
            "league_ratings_rejected_games_total",
            "Results rejected as invalid",
        )?;
        registry.register(Box::new(rejected_games_total.clone()))?;

        let predictions_total =
            IntCounter::new("league_ratings_predictions_total", "Predictions served")?;
        registry.register(Box::new(predictions_total.clone()))?;

        let errors_total = IntCounterVec::new(
            Opts::new("league_ratings_errors_total", "Failures by error kind"),
            &["kind"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;

        let rating_delta = Histogram::with_opts(
            HistogramOpts::new(
                "league_ratings_rating_delta",
                "Absolute rating moved per game",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0]),
        )?;
        registry.register(Box::new(rating_delta.clone()))?;

        Ok(Self {
            games_recorded_total,
            duplicate_games_total,
            rejected_games_total,
            predictions_total,
            errors_total,
            rating_delta,
        })
    }
}

impl LeagueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let teams = IntGauge::new("league_ratings_teams", "Teams with a rating")?;
        registry.register(Box::new(teams.clone()))?;

        let games_logged = IntGauge::new("league_ratings_games_logged", "Games in the log")?;
        registry.register(Box::new(games_logged.clone()))?;

        Ok(Self {
            teams,
            games_logged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::engine::RatingEngine;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        assert_eq!(collector.game().games_recorded_total.get(), 0);
        assert_eq!(collector.league().teams.get(), 0);
    }

    #[test]
    fn test_game_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let mut engine = RatingEngine::default();
        let record = engine.record_game("A", "B", 90, 85).unwrap();

        collector.record_game(&record);
        collector.record_duplicates(3);
        collector.record_rejected(1);
        collector.record_prediction();
        collector.update_league_size(engine.team_count(), engine.games().len());

        assert_eq!(collector.game().games_recorded_total.get(), 1);
        assert_eq!(collector.game().duplicate_games_total.get(), 3);
        assert_eq!(collector.game().rejected_games_total.get(), 1);
        assert_eq!(collector.game().predictions_total.get(), 1);
        assert_eq!(collector.game().rating_delta.get_sample_count(), 1);
        assert_eq!(collector.league().teams.get(), 2);
        assert_eq!(collector.league().games_logged.get(), 1);
    }

    #[test]
    fn test_error_counting_and_encoding() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_error("persistence_failure");
        collector.record_error("persistence_failure");
        collector.record_error("source_unavailable");

        assert_eq!(
            collector
                .game()
                .errors_total
                .with_label_values(&["persistence_failure"])
                .get(),
            2
        );

        let text = collector.encode_text().unwrap();
        assert!(text.contains("league_ratings_errors_total"));
        assert!(text.contains("source_unavailable"));
    }

    #[test]
    fn test_collectors_are_independent() {
        let first = MetricsCollector::new().unwrap();
        let second = MetricsCollector::new().unwrap();

        first.record_prediction();
        assert_eq!(second.game().predictions_total.get(), 0);
    }
}
