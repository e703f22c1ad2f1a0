use crate::ai::QuestionGenerator;
use crate::config::Config;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared application state, constructed once in `main` and injected into
/// every handler. Holds the store handle, config and the question-generator
/// port so none of them live as globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub generator: Arc<dyn QuestionGenerator>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn QuestionGenerator> {
    fn from_ref(state: &AppState) -> Self {
        state.generator.clone()
    }
}
