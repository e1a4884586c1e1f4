//! Common types used throughout the rating service

use crate::rating::margin::EngineParameters;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Unique identifier for teams
pub type TeamId = String;

/// A completed game as delivered by a result supplier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameResult {
    pub home_id: TeamId,
    pub away_id: TeamId,
    pub home_score: u32,
    pub away_score: u32,
}

impl GameResult {
    pub fn new(
        home_id: impl Into<TeamId>,
        away_id: impl Into<TeamId>,
        home_score: u32,
        away_score: u32,
    ) -> Self {
        Self {
            home_id: home_id.into(),
            away_id: away_id.into(),
            home_score,
            away_score,
        }
    }

    /// Signed point differential, home minus away
    pub fn actual_margin(&self) -> i64 {
        i64::from(self.home_score) - i64::from(self.away_score)
    }

    /// Whether both sides name the same team
    pub fn is_self_play(&self) -> bool {
        self.home_id == self.away_id
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}-{} {}",
            self.home_id, self.home_score, self.away_score, self.away_id
        )
    }
}

/// Audit entry produced once per recorded game
///
/// `home_rating_after = home_rating_before + rating_delta` and
/// `away_rating_after = away_rating_before - rating_delta` always hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub timestamp: DateTime<Utc>,
    pub home_id: TeamId,
    pub away_id: TeamId,
    pub home_score: u32,
    pub away_score: u32,
    pub home_rating_before: f64,
    pub away_rating_before: f64,
    pub home_rating_after: f64,
    pub away_rating_after: f64,
    pub expected_mov: f64,
    pub actual_mov: i64,
    pub rating_delta: f64,
}

impl GameRecord {
    /// The game result this record was produced from
    pub fn result(&self) -> GameResult {
        GameResult {
            home_id: self.home_id.clone(),
            away_id: self.away_id.clone(),
            home_score: self.home_score,
            away_score: self.away_score,
        }
    }

    /// Same teams and same score as `result`
    pub fn matches(&self, result: &GameResult) -> bool {
        self.home_id == result.home_id
            && self.away_id == result.away_id
            && self.home_score == result.home_score
            && self.away_score == result.away_score
    }

    /// Whether `team_id` took part in this game
    pub fn involves(&self, team_id: &str) -> bool {
        self.home_id == team_id || self.away_id == team_id
    }
}

/// Outcome forecast for a game that has not been played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub home_id: TeamId,
    pub away_id: TeamId,
    pub home_rating: f64,
    pub away_rating: f64,
    pub expected_mov: f64,
    pub home_win_probability: f64,
}

/// One row of the standings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based position
    pub rank: usize,
    pub team_id: TeamId,
    pub display_name: String,
    pub rating: f64,
}

/// A team's rating after one of its games
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingPoint {
    /// 1-based position of the game in the league log
    pub game_number: usize,
    pub timestamp: DateTime<Utc>,
    pub opponent_id: TeamId,
    pub at_home: bool,
    pub rating_before: f64,
    pub rating_after: f64,
    /// Change from this team's perspective
    pub delta: f64,
}

/// Aggregate view of the league
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub teams: usize,
    pub games_played: usize,
    pub average_rating: f64,
    pub top: Option<Standing>,
    pub bottom: Option<Standing>,
}

/// Downloadable dump of the current ratings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingsExport {
    pub timestamp: DateTime<Utc>,
    pub parameters: EngineParameters,
    pub ratings: BTreeMap<TeamId, f64>,
    pub games_played: usize,
}

/// Persistable engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueState {
    pub saved_at: DateTime<Utc>,
    pub parameters: EngineParameters,
    pub ratings: BTreeMap<TeamId, f64>,
    pub games: Vec<GameRecord>,
}

/// Everything the persistence boundary hands back on load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub initial_ratings: HashMap<TeamId, f64>,
    pub team_names: HashMap<TeamId, String>,
    /// `None` until the first save
    pub state: Option<LeagueState>,
}

/// Outcome of merging a batch of fetched results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub fetched: usize,
    pub added: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub records: Vec<GameRecord>,
}
