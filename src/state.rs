use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    services::{attempts::AttemptService, roster::SqlCourseRoster},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub attempts: AttemptService,
}

impl AppState {
    /// Wires the attempt engine to the roster tables in the same database.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let roster = Arc::new(SqlCourseRoster::new(pool.clone()));
        let attempts = AttemptService::new(pool.clone(), roster);
        Self {
            pool,
            config,
            attempts,
        }
    }
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

impl FromRef<AppState> for AttemptService {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}
