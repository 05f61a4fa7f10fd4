// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
  pub id: i64,
  pub email: String,
  pub name: Option<String>,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub is_admin: bool,
  pub created_at: DateTime<Utc>,
}
