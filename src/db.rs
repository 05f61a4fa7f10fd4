// src/db.rs

//! SQLite pool construction and schema bootstrap.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::errors::Result;

/// Opens (creating if missing) the SQLite database at `db_path`.
/// Foreign key enforcement is enabled per connection; line-item rows
/// must reference a real order header.
pub async fn connect(db_path: &str) -> Result<SqlitePool> {
  let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path))
    .or_else(|_| SqliteConnectOptions::from_str(db_path))?
    .create_if_missing(true)
    .foreign_keys(true);

  let pool = SqlitePoolOptions::new().connect_with(options).await?;
  Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
  sqlx::raw_sql(
    r#"
    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      email TEXT NOT NULL UNIQUE,
      name TEXT,
      password_hash TEXT NOT NULL,
      is_admin INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS products (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      price REAL NOT NULL
    );

    CREATE TABLE IF NOT EXISTS orders (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER REFERENCES users(id),
      guest_email TEXT,
      guest_name TEXT,
      status TEXT NOT NULL DEFAULT 'pending',
      subtotal REAL NOT NULL DEFAULT 0,
      discount REAL NOT NULL DEFAULT 0,
      shipping_cost REAL NOT NULL DEFAULT 0,
      total REAL NOT NULL DEFAULT 0,
      shipping_address TEXT NOT NULL,
      billing_address TEXT NOT NULL,
      payment_method TEXT NOT NULL DEFAULT 'card',
      payment_details TEXT,
      cancellation_reason TEXT,
      created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS order_items (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
      product_id INTEGER REFERENCES products(id) ON DELETE SET NULL,
      quantity INTEGER NOT NULL,
      price REAL NOT NULL,
      selected_color TEXT
    );

    CREATE TABLE IF NOT EXISTS promo_codes (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      code TEXT NOT NULL UNIQUE COLLATE NOCASE,
      discount_type TEXT NOT NULL,
      value REAL NOT NULL,
      min_subtotal REAL NOT NULL DEFAULT 0,
      active INTEGER NOT NULL DEFAULT 1
    );
    "#,
  )
  .execute(pool)
  .await?;

  Ok(())
}
