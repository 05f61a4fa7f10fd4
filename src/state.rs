// src/state.rs

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: SqlitePool,
  pub config: Arc<AppConfig>,
}
