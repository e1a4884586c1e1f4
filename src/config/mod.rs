//! Configuration management for the league ratings service
//!
//! This module handles configuration loading from environment variables or
//! a TOML file, validation, and default values.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings, SourceSettings, StorageSettings};
pub use rating::RatingConfig;
