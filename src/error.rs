//! Error types for the league ratings service
//!
//! Errors propagate as `anyhow::Error`; the `LeagueError` kinds below are
//! attached at the point of failure so callers can classify them with
//! `downcast_ref`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LeagueError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Result source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("Persistence failure: {message}")]
    PersistenceFailure { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl LeagueError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            LeagueError::InvalidInput { .. } => "invalid_input",
            LeagueError::SourceUnavailable { .. } => "source_unavailable",
            LeagueError::PersistenceFailure { .. } => "persistence_failure",
            LeagueError::ConfigurationError { .. } => "configuration_error",
            LeagueError::InternalError { .. } => "internal_error",
        }
    }

    /// Classify an arbitrary error, falling back to `internal_error`
    pub fn kind_of(error: &anyhow::Error) -> &'static str {
        error
            .downcast_ref::<LeagueError>()
            .map(LeagueError::kind)
            .unwrap_or("internal_error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_classifies_wrapped_errors() {
        let err: anyhow::Error = LeagueError::SourceUnavailable {
            message: "timeout".to_string(),
        }
        .into();
        assert_eq!(LeagueError::kind_of(&err), "source_unavailable");

        let other = anyhow::anyhow!("something else");
        assert_eq!(LeagueError::kind_of(&other), "internal_error");
    }

    #[test]
    fn test_error_display() {
        let err = LeagueError::InvalidInput {
            reason: "team cannot play itself".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid input: team cannot play itself");
    }
}
