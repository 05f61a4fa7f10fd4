// tests/common/mod.rs

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use gaia_commerce::config::AppConfig;
use gaia_commerce::db;
use gaia_commerce::models::User;
use gaia_commerce::services::{auth_service, tokens};
use gaia_commerce::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Fresh in-memory database per test. A single connection keeps the
/// in-memory database alive and shared across the test's queries.
pub async fn test_state() -> AppState {
  let options = SqliteConnectOptions::from_str("sqlite::memory:")
    .expect("in-memory sqlite options")
    .foreign_keys(true);
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .connect_with(options)
    .await
    .expect("in-memory sqlite pool");
  db::init_schema(&pool).await.expect("schema init");

  AppState {
    db_pool: pool,
    config: Arc::new(AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      db_path: ":memory:".to_string(),
      jwt_secret: TEST_JWT_SECRET.to_string(),
    }),
  }
}

pub async fn seed_product(pool: &SqlitePool, id: i64, name: &str, price: f64) {
  sqlx::query("INSERT INTO products (id, name, price) VALUES (?, ?, ?)")
    .bind(id)
    .bind(name)
    .bind(price)
    .execute(pool)
    .await
    .expect("seed product");
}

pub async fn seed_user(pool: &SqlitePool, email: &str, name: &str, is_admin: bool) -> User {
  let hash = auth_service::hash_password("password123").expect("hash");
  sqlx::query("INSERT INTO users (email, name, password_hash, is_admin) VALUES (?, ?, ?, ?)")
    .bind(email)
    .bind(name)
    .bind(&hash)
    .bind(is_admin)
    .execute(pool)
    .await
    .expect("seed user");
  sqlx::query_as("SELECT * FROM users WHERE email = ?")
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("fetch seeded user")
}

pub fn bearer_for(user: &User) -> String {
  let token = tokens::issue_token(user, TEST_JWT_SECRET).expect("issue token");
  format!("Bearer {}", token)
}

/// A minimal valid order: one line of product 7 at 499 x2.
pub fn single_line_order_payload() -> serde_json::Value {
  serde_json::json!({
    "items": [{"id": 7, "price": 499.0, "quantity": 2}],
    "subtotal": 998.0,
    "discount": 0.0,
    "shippingCost": 0.0,
    "total": 998.0,
    "shippingAddress": {"fullName": "A", "city": "Pune", "postalCode": "411001"},
    "paymentMethod": "cod"
  })
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
  let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
    .fetch_one(pool)
    .await
    .expect("count");
  n
}
