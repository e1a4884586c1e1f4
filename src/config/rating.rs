//! Rating system configuration

use crate::rating::margin::EngineParameters;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rating parameters as they appear in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub k_factor: f64,
    pub home_advantage: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        let defaults = EngineParameters::default();
        Self {
            k_factor: defaults.k_factor,
            home_advantage: defaults.home_advantage,
        }
    }
}

impl RatingConfig {
    pub fn parameters(&self) -> EngineParameters {
        EngineParameters::new(self.k_factor, self.home_advantage)
    }

    /// Reject non-finite values and log anything outside the usual ranges
    pub fn validate(&self) -> crate::error::Result<()> {
        let parameters = self.parameters();
        parameters.validate()?;

        for warning in parameters.range_warnings() {
            warn!("Rating configuration: {}", warning);
        }

        Ok(())
    }
}
