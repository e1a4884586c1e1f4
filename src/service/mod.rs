//! Service layer for the league ratings service
//!
//! This module contains the shared league state with its persistence and
//! ingestion flows, and the HTTP API served on top of it.

pub mod api;
pub mod league;

pub use api::{router, ApiServer, ApiState};
pub use league::LeagueService;
