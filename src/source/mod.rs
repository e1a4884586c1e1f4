//! Game result suppliers
//!
//! Fetching and parsing live outside the rating engine; this module only
//! defines the boundary and a couple of local implementations.

pub mod provider;

// Re-export commonly used types
pub use provider::{JsonFileResultSource, ResultSource, StaticResultSource};
