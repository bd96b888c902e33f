use std::fmt;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::QuizzerArgs;

#[derive(Clone)]
pub struct QuizzerState {
    pub db_pool: SqlitePool,
    pub config: QuizzerArgs,
}

impl QuizzerState {
    #[must_use]
    pub const fn new(db_pool: SqlitePool, config: QuizzerArgs) -> Self {
        Self { db_pool, config }
    }
}

impl fmt::Debug for QuizzerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizzerState")
            .field("db_pool", &self.db_pool)
            .field("config", &self.config)
            .finish()
    }
}

impl FromRef<QuizzerState> for SqlitePool {
    fn from_ref(state: &QuizzerState) -> Self {
        state.db_pool.clone()
    }
}
