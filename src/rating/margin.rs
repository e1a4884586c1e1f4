//! Margin-of-victory update rule
//!
//! Ratings live on a points scale: the expected margin of a game is the
//! home rating plus home advantage minus the away rating, and each game
//! moves rating by `k_factor` times the difference between the actual and
//! expected margins.

use crate::error::LeagueError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Scale of the logistic mapping from expected margin to win probability
pub const PROBABILITY_SCALE: f64 = 10.0;

/// K-factor values callers normally choose from
pub const RECOMMENDED_K_FACTOR: RangeInclusive<f64> = 0.01..=0.2;

/// Home advantage values callers normally choose from
pub const RECOMMENDED_HOME_ADVANTAGE: RangeInclusive<f64> = 0.0..=5.0;

/// Tunable parameters of the rating engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineParameters {
    /// Rating points moved per point of margin surprise
    pub k_factor: f64,
    /// Points credited to the home side before computing the expected margin
    pub home_advantage: f64,
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            k_factor: 0.05,
            home_advantage: 2.2,
        }
    }
}

impl EngineParameters {
    pub fn new(k_factor: f64, home_advantage: f64) -> Self {
        Self {
            k_factor,
            home_advantage,
        }
    }

    /// Slower rating changes
    pub fn conservative() -> Self {
        Self {
            k_factor: 0.02,
            ..Self::default()
        }
    }

    /// Faster rating changes
    pub fn aggressive() -> Self {
        Self {
            k_factor: 0.12,
            ..Self::default()
        }
    }

    /// Reject values that would poison every rating they touch.
    ///
    /// The engine itself stores whatever it is given; this check is applied
    /// where parameters enter from configuration or the API.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.k_factor.is_finite() {
            return Err(LeagueError::ConfigurationError {
                message: format!("K-factor must be finite, got {}", self.k_factor),
            }
            .into());
        }

        if !self.home_advantage.is_finite() {
            return Err(LeagueError::ConfigurationError {
                message: format!(
                    "Home advantage must be finite, got {}",
                    self.home_advantage
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Human-readable notes for values outside the usual ranges
    pub fn range_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.k_factor <= 0.0 {
            warnings.push(format!(
                "k_factor {} is not positive; results will not pull ratings toward them",
                self.k_factor
            ));
        } else if !RECOMMENDED_K_FACTOR.contains(&self.k_factor) {
            warnings.push(format!(
                "k_factor {} is outside the usual range {:?}",
                self.k_factor, RECOMMENDED_K_FACTOR
            ));
        }

        if !RECOMMENDED_HOME_ADVANTAGE.contains(&self.home_advantage) {
            warnings.push(format!(
                "home_advantage {} is outside the usual range {:?}",
                self.home_advantage, RECOMMENDED_HOME_ADVANTAGE
            ));
        }

        warnings
    }

    /// Expected home-minus-away margin for the given ratings
    pub fn expected_margin(&self, home_rating: f64, away_rating: f64) -> f64 {
        home_rating + self.home_advantage - away_rating
    }

    /// Rating moved from away to home for a game's surprise
    pub fn rating_delta(&self, actual_margin: f64, expected_margin: f64) -> f64 {
        self.k_factor * (actual_margin - expected_margin)
    }
}

/// Home win probability for an expected margin
pub fn margin_to_probability(expected_margin: f64) -> f64 {
    1.0 / (1.0 + (-expected_margin / PROBABILITY_SCALE).exp())
}
