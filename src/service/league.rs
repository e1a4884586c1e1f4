//! League service coordination
//!
//! `LeagueService` shares one `RatingEngine` between concurrent callers.
//! Writers are serialized through the engine lock and readers never see a
//! half-applied game. Every mutation is applied to a copy of the engine,
//! saved, and only then committed, so a failed fetch or save leaves the
//! live ratings and log exactly as they were.

use crate::error::{LeagueError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::{EngineParameters, LeagueStore, RatingEngine};
use crate::source::ResultSource;
use crate::types::{
    GameRecord, GameResult, IngestReport, LeagueSnapshot, LeagueSummary, Prediction, RatingPoint,
    RatingsExport, Standing, TeamId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub struct LeagueService {
    engine: RwLock<RatingEngine>,
    initial_ratings: HashMap<TeamId, f64>,
    store: Arc<dyn LeagueStore>,
    metrics: Arc<MetricsCollector>,
}

impl LeagueService {
    /// Load the league from `store`.
    ///
    /// A saved state is restored as-is; otherwise the engine starts from
    /// the stored initial ratings. `parameters` apply from now on.
    pub fn open(
        store: Arc<dyn LeagueStore>,
        parameters: EngineParameters,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        let LeagueSnapshot {
            initial_ratings,
            team_names,
            state,
        } = store.load().map_err(|e| {
            let e = as_persistence_failure(e);
            metrics.record_error(LeagueError::kind_of(&e));
            e
        })?;

        let engine = match state {
            Some(state) => {
                info!(
                    "Restoring league from {}: {} teams, {} games (saved {})",
                    store.describe(),
                    state.ratings.len(),
                    state.games.len(),
                    state.saved_at
                );
                RatingEngine::restore(team_names, parameters, state.ratings, state.games)
            }
            None => {
                info!(
                    "Starting league from {} with {} initial ratings",
                    store.describe(),
                    initial_ratings.len()
                );
                RatingEngine::new(initial_ratings.clone(), team_names, parameters)
            }
        };

        metrics.update_league_size(engine.team_count(), engine.games().len());

        Ok(Self {
            engine: RwLock::new(engine),
            initial_ratings,
            store,
            metrics,
        })
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Record one game, resolving display names to ids first
    pub async fn record_game(&self, result: GameResult) -> Result<GameRecord> {
        let mut engine = self.engine.write().await;
        let resolved = engine.resolve_result(&result);

        let mut candidate = engine.clone();
        let record = candidate
            .record_result(&resolved)
            .map_err(|e| self.track_error(e))?;

        self.persist(&candidate)?;
        *engine = candidate;

        self.metrics.record_game(&record);
        self.metrics
            .update_league_size(engine.team_count(), engine.games().len());

        info!(
            "Game recorded: {} - delta {:+.3}, expected {:.2}, actual {}",
            resolved, record.rating_delta, record.expected_mov, record.actual_mov
        );
        Ok(record)
    }

    /// Fetch results from `source` and record the ones not yet logged.
    ///
    /// Duplicates (same teams and score as a logged game) and self-play
    /// results are skipped and counted in the report.
    pub async fn ingest(&self, source: &dyn ResultSource) -> Result<IngestReport> {
        let fetched = source.fetch_results().await.map_err(|e| {
            error!("Fetching results from {} failed: {}", source.describe(), e);
            self.track_error(as_source_unavailable(e))
        })?;

        let mut engine = self.engine.write().await;
        let mut candidate = engine.clone();
        let mut report = IngestReport {
            fetched: fetched.len(),
            ..IngestReport::default()
        };

        for result in &fetched {
            let resolved = candidate.resolve_result(result);
            if candidate.contains_result(&resolved) {
                debug!("Skipping already recorded result {}", resolved);
                report.duplicates += 1;
                continue;
            }

            match candidate.record_result(&resolved) {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    warn!("Rejecting result {}: {}", resolved, e);
                    report.rejected += 1;
                }
            }
        }
        report.added = report.records.len();

        if report.added > 0 {
            self.persist(&candidate)?;
            *engine = candidate;

            for record in &report.records {
                self.metrics.record_game(record);
            }
            self.metrics
                .update_league_size(engine.team_count(), engine.games().len());
        }
        self.metrics.record_duplicates(report.duplicates);
        self.metrics.record_rejected(report.rejected);

        info!(
            "Ingested from {}: {} fetched, {} added, {} duplicates, {} rejected",
            source.describe(),
            report.fetched,
            report.added,
            report.duplicates,
            report.rejected
        );
        Ok(report)
    }

    /// Discard the log and return every team to its initial rating
    pub async fn reset(&self) -> Result<()> {
        let mut engine = self.engine.write().await;
        let candidate = RatingEngine::new(
            self.initial_ratings.clone(),
            engine.team_names().clone(),
            engine.parameters(),
        );

        self.persist(&candidate)?;
        let discarded = engine.games().len();
        *engine = candidate;

        self.metrics
            .update_league_size(engine.team_count(), engine.games().len());
        info!("League reset, {} games discarded", discarded);
        Ok(())
    }

    /// Replace the engine parameters for future games
    pub async fn set_parameters(&self, parameters: EngineParameters) -> Result<EngineParameters> {
        parameters.validate().map_err(|e| {
            self.track_error(
                LeagueError::InvalidInput {
                    reason: e.to_string(),
                }
                .into(),
            )
        })?;
        for warning in parameters.range_warnings() {
            warn!("Parameter update: {}", warning);
        }

        let mut engine = self.engine.write().await;
        let mut candidate = engine.clone();
        candidate.set_parameters(parameters);

        self.persist(&candidate)?;
        *engine = candidate;

        info!(
            "Parameters updated: k_factor {}, home_advantage {}",
            parameters.k_factor, parameters.home_advantage
        );
        Ok(parameters)
    }

    pub async fn parameters(&self) -> EngineParameters {
        self.engine.read().await.parameters()
    }

    pub async fn standings(&self) -> Vec<Standing> {
        self.engine.read().await.standings()
    }

    pub async fn rating_of(&self, team: &str) -> f64 {
        let engine = self.engine.read().await;
        engine.rating_of(&engine.resolve_team(team))
    }

    pub async fn display_name(&self, team: &str) -> String {
        let engine = self.engine.read().await;
        let team_id = engine.resolve_team(team);
        engine.display_name(&team_id).to_string()
    }

    pub async fn predict(&self, home: &str, away: &str) -> Prediction {
        let engine = self.engine.read().await;
        let prediction = engine.predict(&engine.resolve_team(home), &engine.resolve_team(away));
        self.metrics.record_prediction();
        debug!(
            "Prediction {} vs {}: margin {:.2}, home win {:.3}",
            prediction.home_id,
            prediction.away_id,
            prediction.expected_mov,
            prediction.home_win_probability
        );
        prediction
    }

    pub async fn games(&self) -> Vec<GameRecord> {
        self.engine.read().await.games().to_vec()
    }

    pub async fn recent_games(&self, count: usize) -> Vec<GameRecord> {
        self.engine.read().await.recent_games(count).to_vec()
    }

    pub async fn team_history(&self, team: &str) -> Vec<RatingPoint> {
        let engine = self.engine.read().await;
        engine.team_history(&engine.resolve_team(team))
    }

    pub async fn summary(&self) -> LeagueSummary {
        self.engine.read().await.summary()
    }

    pub async fn export(&self) -> RatingsExport {
        self.engine.read().await.export()
    }

    pub async fn total_rating(&self) -> f64 {
        self.engine.read().await.total_rating()
    }

    fn persist(&self, engine: &RatingEngine) -> Result<()> {
        self.store.save(&engine.state()).map_err(|e| {
            error!("Saving league to {} failed: {}", self.store.describe(), e);
            self.track_error(as_persistence_failure(e))
        })
    }

    fn track_error(&self, error: anyhow::Error) -> anyhow::Error {
        self.metrics.record_error(LeagueError::kind_of(&error));
        error
    }
}

fn as_persistence_failure(error: anyhow::Error) -> anyhow::Error {
    match error.downcast_ref::<LeagueError>() {
        Some(LeagueError::PersistenceFailure { .. }) => error,
        _ => LeagueError::PersistenceFailure {
            message: error.to_string(),
        }
        .into(),
    }
}

fn as_source_unavailable(error: anyhow::Error) -> anyhow::Error {
    match error.downcast_ref::<LeagueError>() {
        Some(LeagueError::SourceUnavailable { .. }) => error,
        _ => LeagueError::SourceUnavailable {
            message: error.to_string(),
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{InMemoryLeagueStore, MockLeagueStore};
    use crate::source::provider::MockResultSource;
    use crate::source::StaticResultSource;
    use crate::types::LeagueState;

    fn seeded_store() -> Arc<InMemoryLeagueStore> {
        Arc::new(InMemoryLeagueStore::with_seed(
            HashMap::from([("syd".to_string(), 2.0), ("mel".to_string(), -2.0)]),
            HashMap::from([
                ("syd".to_string(), "Sydney Kings".to_string()),
                ("mel".to_string(), "Melbourne United".to_string()),
            ]),
        ))
    }

    fn open(store: Arc<dyn LeagueStore>) -> LeagueService {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        LeagueService::open(store, EngineParameters::default(), metrics).unwrap()
    }

    fn mock_source(results: Vec<GameResult>) -> MockResultSource {
        let mut source = MockResultSource::new();
        source
            .expect_fetch_results()
            .times(1)
            .returning(move || Ok(results.clone()));
        source.expect_describe().return_const("mock".to_string());
        source
    }

    #[tokio::test]
    async fn test_open_starts_from_initial_ratings() {
        let service = open(seeded_store());

        assert_eq!(service.rating_of("syd").await, 2.0);
        assert_eq!(service.rating_of("Melbourne United").await, -2.0);
        assert_eq!(service.display_name("syd").await, "Sydney Kings");
        assert!(service.games().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_game_saves_state() {
        let store = seeded_store();
        let service = open(store.clone());

        let record = service
            .record_game(GameResult::new("Sydney Kings", "mel", 90, 85))
            .await
            .unwrap();

        assert_eq!(record.home_id, "syd");
        assert!((record.expected_mov - 6.2).abs() < 1e-9);

        let saved = store.saved_state().unwrap();
        assert_eq!(saved.games.len(), 1);
        assert_eq!(saved.ratings["syd"], service.rating_of("syd").await);
        assert_eq!(service.metrics().game().games_recorded_total.get(), 1);
    }

    #[tokio::test]
    async fn test_open_restores_saved_state() {
        let store = seeded_store();
        {
            let service = open(store.clone());
            service
                .record_game(GameResult::new("syd", "mel", 70, 90))
                .await
                .unwrap();
        }

        let reopened = open(store.clone());
        let saved: LeagueState = store.saved_state().unwrap();
        assert_eq!(reopened.games().await.len(), 1);
        assert_eq!(reopened.rating_of("syd").await, saved.ratings["syd"]);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_untouched() {
        let store = Arc::new(MockLeagueStore::new());
        let service = open(store.clone());
        service
            .record_game(GameResult::new("A", "B", 90, 85))
            .await
            .unwrap();

        store.set_fail_saves(true);
        let err = service
            .record_game(GameResult::new("B", "A", 80, 100))
            .await
            .unwrap_err();

        assert_eq!(LeagueError::kind_of(&err), "persistence_failure");
        assert_eq!(service.games().await.len(), 1);
        assert!((service.rating_of("A").await - 0.14).abs() < 1e-9);
        assert_eq!(
            service
                .metrics()
                .game()
                .errors_total
                .with_label_values(&["persistence_failure"])
                .get(),
            1
        );

        assert!(service.reset().await.is_err());
        assert_eq!(service.games().await.len(), 1);
    }

    #[tokio::test]
    async fn test_open_prefers_saved_state_over_initial_ratings() {
        let store = Arc::new(MockLeagueStore::new());
        let saved = RatingEngine::replay(
            HashMap::new(),
            HashMap::new(),
            EngineParameters::default(),
            vec![GameResult::new("A", "B", 90, 85)],
        )
        .unwrap()
        .state();
        store
            .preset_snapshot(LeagueSnapshot {
                initial_ratings: HashMap::from([("A".to_string(), 5.0)]),
                team_names: HashMap::new(),
                state: Some(saved),
            })
            .unwrap();

        let service = open(store);
        assert!((service.rating_of("A").await - 0.14).abs() < 1e-9);
        assert_eq!(service.games().await.len(), 1);

        service.reset().await.unwrap();
        assert_eq!(service.rating_of("A").await, 5.0);
    }

    #[tokio::test]
    async fn test_failed_load_is_persistence_failure() {
        let store = Arc::new(MockLeagueStore::new());
        store.set_fail_loads(true);

        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let err = LeagueService::open(store, EngineParameters::default(), metrics)
            .err()
            .unwrap();
        assert_eq!(LeagueError::kind_of(&err), "persistence_failure");
    }

    #[tokio::test]
    async fn test_self_play_rejected() {
        let service = open(seeded_store());
        let err = service
            .record_game(GameResult::new("syd", "Sydney Kings", 90, 80))
            .await
            .unwrap_err();

        assert_eq!(LeagueError::kind_of(&err), "invalid_input");
        assert!(service.games().await.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_skips_duplicates_and_self_play() {
        let service = open(seeded_store());
        service
            .record_game(GameResult::new("syd", "mel", 90, 85))
            .await
            .unwrap();

        let source = mock_source(vec![
            GameResult::new("Sydney Kings", "Melbourne United", 90, 85),
            GameResult::new("mel", "per", 77, 80),
            GameResult::new("per", "per", 10, 0),
            GameResult::new("mel", "per", 77, 80),
        ]);

        let report = service.ingest(&source).await.unwrap();

        assert_eq!(report.fetched, 4);
        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.records[0].away_id, "per");
        assert_eq!(service.games().await.len(), 2);
    }

    #[tokio::test]
    async fn test_ingest_source_failure_leaves_state_untouched() {
        let service = open(seeded_store());
        let before = service.standings().await;

        let mut source = MockResultSource::new();
        source
            .expect_fetch_results()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("connection refused")));
        source.expect_describe().return_const("mock".to_string());

        let err = service.ingest(&source).await.unwrap_err();

        assert_eq!(LeagueError::kind_of(&err), "source_unavailable");
        assert_eq!(service.standings().await, before);
        assert!(service.games().await.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_with_nothing_new_does_not_save() {
        let store = Arc::new(MockLeagueStore::new());
        let service = open(store.clone());

        let report = service
            .ingest(&StaticResultSource::default())
            .await
            .unwrap();

        assert_eq!(report.fetched, 0);
        assert!(store.get_save_calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_restores_initial_ratings() {
        let service = open(seeded_store());
        service
            .set_parameters(EngineParameters::new(0.1, 3.0))
            .await
            .unwrap();
        service
            .record_game(GameResult::new("mel", "syd", 100, 60))
            .await
            .unwrap();
        service
            .record_game(GameResult::new("per", "syd", 90, 60))
            .await
            .unwrap();

        service.reset().await.unwrap();

        assert!(service.games().await.is_empty());
        assert_eq!(service.rating_of("syd").await, 2.0);
        assert_eq!(service.rating_of("per").await, 0.0);
        assert_eq!(service.standings().await.len(), 2);
        assert_eq!(service.parameters().await, EngineParameters::new(0.1, 3.0));
    }

    #[tokio::test]
    async fn test_set_parameters_validation() {
        let service = open(seeded_store());

        let err = service
            .set_parameters(EngineParameters::new(f64::NAN, 2.2))
            .await
            .unwrap_err();
        assert_eq!(LeagueError::kind_of(&err), "invalid_input");
        assert_eq!(service.parameters().await, EngineParameters::default());
    }

    #[tokio::test]
    async fn test_predict_counts_and_resolves_names() {
        let service = open(seeded_store());

        let prediction = service.predict("Sydney Kings", "mel").await;

        assert_eq!(prediction.home_id, "syd");
        assert!((prediction.expected_mov - 6.2).abs() < 1e-9);
        assert_eq!(service.metrics().game().predictions_total.get(), 1);
    }
}
