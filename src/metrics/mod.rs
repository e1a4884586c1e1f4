//! Metrics and monitoring for the rating service
//!
//! This module provides Prometheus metrics for recorded games, predictions
//! and failures.

pub mod collector;

pub use collector::{GameMetrics, LeagueMetrics, MetricsCollector};
