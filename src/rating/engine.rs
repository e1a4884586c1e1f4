//! The rating engine
//!
//! `RatingEngine` owns the team rating map, the update parameters and the
//! append-only log of processed games. Every recorded game moves exactly
//! `delta` rating from one side to the other, so the sum of all ratings
//! never changes. Past records are never edited; corrections are made by
//! replaying an amended result sequence through a fresh engine.

use crate::error::{LeagueError, Result};
use crate::rating::margin::{margin_to_probability, EngineParameters};
use crate::types::{
    GameRecord, GameResult, LeagueState, LeagueSummary, Prediction, RatingPoint, RatingsExport,
    Standing, TeamId,
};
use crate::utils::current_timestamp;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Rating assumed for a team that has never been seen
pub const DEFAULT_RATING: f64 = 0.0;

#[derive(Debug, Clone, Default)]
pub struct RatingEngine {
    ratings: HashMap<TeamId, f64>,
    team_names: HashMap<TeamId, String>,
    parameters: EngineParameters,
    games: Vec<GameRecord>,
}

impl RatingEngine {
    /// Create an engine from starting ratings and display names.
    ///
    /// Neither map is validated; parameters are stored as given.
    pub fn new(
        initial_ratings: HashMap<TeamId, f64>,
        team_names: HashMap<TeamId, String>,
        parameters: EngineParameters,
    ) -> Self {
        Self {
            ratings: initial_ratings,
            team_names,
            parameters,
            games: Vec::new(),
        }
    }

    /// Rebuild an engine from persisted ratings and log, without recomputing
    pub fn restore(
        team_names: HashMap<TeamId, String>,
        parameters: EngineParameters,
        ratings: impl IntoIterator<Item = (TeamId, f64)>,
        games: Vec<GameRecord>,
    ) -> Self {
        Self {
            ratings: ratings.into_iter().collect(),
            team_names,
            parameters,
            games,
        }
    }

    /// Build an engine by replaying `results` in order from `initial_ratings`
    pub fn replay(
        initial_ratings: HashMap<TeamId, f64>,
        team_names: HashMap<TeamId, String>,
        parameters: EngineParameters,
        results: impl IntoIterator<Item = GameResult>,
    ) -> Result<Self> {
        let mut engine = Self::new(initial_ratings, team_names, parameters);
        for result in results {
            engine.record_result(&result)?;
        }
        Ok(engine)
    }

    pub fn parameters(&self) -> EngineParameters {
        self.parameters
    }

    /// Replace the parameters; only games recorded afterwards are affected
    pub fn set_parameters(&mut self, parameters: EngineParameters) {
        self.parameters = parameters;
    }

    pub fn set_k_factor(&mut self, k_factor: f64) {
        self.parameters.k_factor = k_factor;
    }

    pub fn set_home_advantage(&mut self, home_advantage: f64) {
        self.parameters.home_advantage = home_advantage;
    }

    /// Process one game result and append its audit record.
    ///
    /// Unknown teams enter at `DEFAULT_RATING`. A team playing itself is
    /// rejected with `InvalidInput` and leaves the engine untouched.
    pub fn record_game(
        &mut self,
        home_id: &str,
        away_id: &str,
        home_score: u32,
        away_score: u32,
    ) -> Result<GameRecord> {
        if home_id == away_id {
            return Err(LeagueError::InvalidInput {
                reason: format!("team '{}' cannot play itself", home_id),
            }
            .into());
        }

        let home_before = self.rating_of(home_id);
        let away_before = self.rating_of(away_id);

        let expected_mov = self.parameters.expected_margin(home_before, away_before);
        let actual_mov = i64::from(home_score) - i64::from(away_score);
        let delta = self.parameters.rating_delta(actual_mov as f64, expected_mov);

        let home_after = home_before + delta;
        let away_after = away_before - delta;
        self.ratings.insert(home_id.to_string(), home_after);
        self.ratings.insert(away_id.to_string(), away_after);

        let record = GameRecord {
            timestamp: current_timestamp(),
            home_id: home_id.to_string(),
            away_id: away_id.to_string(),
            home_score,
            away_score,
            home_rating_before: home_before,
            away_rating_before: away_before,
            home_rating_after: home_after,
            away_rating_after: away_after,
            expected_mov,
            actual_mov,
            rating_delta: delta,
        };

        debug!(
            "Recorded {} {}-{} {}: expected {:.2}, actual {}, delta {:+.3}",
            home_id, home_score, away_score, away_id, expected_mov, actual_mov, delta
        );

        self.games.push(record.clone());
        Ok(record)
    }

    pub fn record_result(&mut self, result: &GameResult) -> Result<GameRecord> {
        self.record_game(
            &result.home_id,
            &result.away_id,
            result.home_score,
            result.away_score,
        )
    }

    /// Current rating, `DEFAULT_RATING` for unseen teams
    pub fn rating_of(&self, team_id: &str) -> f64 {
        self.ratings.get(team_id).copied().unwrap_or(DEFAULT_RATING)
    }

    /// Expected home-minus-away margin under the current state
    pub fn expected_margin(&self, home_id: &str, away_id: &str) -> f64 {
        self.parameters
            .expected_margin(self.rating_of(home_id), self.rating_of(away_id))
    }

    /// Forecast a game without changing any state
    pub fn predict(&self, home_id: &str, away_id: &str) -> Prediction {
        let home_rating = self.rating_of(home_id);
        let away_rating = self.rating_of(away_id);
        let expected_mov = self.parameters.expected_margin(home_rating, away_rating);

        Prediction {
            home_id: home_id.to_string(),
            away_id: away_id.to_string(),
            home_rating,
            away_rating,
            expected_mov,
            home_win_probability: margin_to_probability(expected_mov),
        }
    }

    /// All known teams, highest rating first, ties by ascending id
    pub fn standings(&self) -> Vec<Standing> {
        let mut rows: Vec<(&TeamId, f64)> =
            self.ratings.iter().map(|(id, rating)| (id, *rating)).collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        rows.into_iter()
            .enumerate()
            .map(|(index, (team_id, rating))| Standing {
                rank: index + 1,
                team_id: team_id.clone(),
                display_name: self.display_name(team_id).to_string(),
                rating,
            })
            .collect()
    }

    /// Display name for a team, falling back to its id
    pub fn display_name<'a>(&'a self, team_id: &'a str) -> &'a str {
        self.team_names
            .get(team_id)
            .map(String::as_str)
            .unwrap_or(team_id)
    }

    /// Map a display name or id to a team id.
    ///
    /// Known ids win; otherwise a case-insensitive display-name match is
    /// used; anything else is taken as a new id.
    pub fn resolve_team(&self, name_or_id: &str) -> TeamId {
        let candidate = name_or_id.trim();
        if self.ratings.contains_key(candidate) || self.team_names.contains_key(candidate) {
            return candidate.to_string();
        }

        self.team_names
            .iter()
            .filter(|(_, name)| name.eq_ignore_ascii_case(candidate))
            .map(|(id, _)| id)
            .min()
            .cloned()
            .unwrap_or_else(|| candidate.to_string())
    }

    /// `result` with both sides resolved through `resolve_team`
    pub fn resolve_result(&self, result: &GameResult) -> GameResult {
        GameResult {
            home_id: self.resolve_team(&result.home_id),
            away_id: self.resolve_team(&result.away_id),
            home_score: result.home_score,
            away_score: result.away_score,
        }
    }

    /// Whether a logged game has the same teams and score
    pub fn contains_result(&self, result: &GameResult) -> bool {
        self.games.iter().any(|game| game.matches(result))
    }

    /// The full log in processing order
    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    /// The last `count` games, oldest first
    pub fn recent_games(&self, count: usize) -> &[GameRecord] {
        let start = self.games.len().saturating_sub(count);
        &self.games[start..]
    }

    /// Rating trajectory of one team across its games
    pub fn team_history(&self, team_id: &str) -> Vec<RatingPoint> {
        self.games
            .iter()
            .enumerate()
            .filter(|(_, game)| game.involves(team_id))
            .map(|(index, game)| {
                let at_home = game.home_id == team_id;
                let (opponent_id, rating_before, rating_after, delta) = if at_home {
                    (
                        &game.away_id,
                        game.home_rating_before,
                        game.home_rating_after,
                        game.rating_delta,
                    )
                } else {
                    (
                        &game.home_id,
                        game.away_rating_before,
                        game.away_rating_after,
                        -game.rating_delta,
                    )
                };

                RatingPoint {
                    game_number: index + 1,
                    timestamp: game.timestamp,
                    opponent_id: opponent_id.clone(),
                    at_home,
                    rating_before,
                    rating_after,
                    delta,
                }
            })
            .collect()
    }

    pub fn ratings(&self) -> &HashMap<TeamId, f64> {
        &self.ratings
    }

    pub fn team_names(&self) -> &HashMap<TeamId, String> {
        &self.team_names
    }

    pub fn team_count(&self) -> usize {
        self.ratings.len()
    }

    /// Sum of all ratings; unchanged by any recorded game
    pub fn total_rating(&self) -> f64 {
        self.ratings.values().sum()
    }

    pub fn summary(&self) -> LeagueSummary {
        let standings = self.standings();
        let average_rating = if standings.is_empty() {
            0.0
        } else {
            self.total_rating() / standings.len() as f64
        };

        LeagueSummary {
            teams: standings.len(),
            games_played: self.games.len(),
            average_rating,
            top: standings.first().cloned(),
            bottom: standings.last().cloned(),
        }
    }

    pub fn export(&self) -> RatingsExport {
        RatingsExport {
            timestamp: current_timestamp(),
            parameters: self.parameters,
            ratings: self.sorted_ratings(),
            games_played: self.games.len(),
        }
    }

    /// Current state in persistable form
    pub fn state(&self) -> LeagueState {
        LeagueState {
            saved_at: current_timestamp(),
            parameters: self.parameters,
            ratings: self.sorted_ratings(),
            games: self.games.clone(),
        }
    }

    fn sorted_ratings(&self) -> BTreeMap<TeamId, f64> {
        self.ratings
            .iter()
            .map(|(id, rating)| (id.clone(), *rating))
            .collect()
    }
}
