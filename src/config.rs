// src/config.rs

use std::env;
use std::fs::OpenOptions;
use std::io::Write;

use dotenvy::dotenv;
use uuid::Uuid;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub db_path: String,
  pub jwt_secret: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = env::var("PORT")
      .unwrap_or_else(|_| "5000".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid PORT: {}", e)))?;
    let db_path = env::var("DB_PATH").unwrap_or_else(|_| "gaia.db".to_string());

    let jwt_secret = match env::var("JWT_SECRET") {
      Ok(secret) if !secret.is_empty() => secret,
      _ => {
        let secret = generate_jwt_secret();
        persist_jwt_secret(&secret)?;
        tracing::warn!("JWT_SECRET was not set; generated one and appended it to .env");
        secret
      }
    };

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      db_path,
      jwt_secret,
    })
  }
}

fn generate_jwt_secret() -> String {
  format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

// Persisting keeps tokens issued before a restart verifiable.
fn persist_jwt_secret(secret: &str) -> Result<()> {
  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(".env")
    .map_err(|e| AppError::Config(format!("Unable to open .env for writing: {}", e)))?;
  writeln!(file, "JWT_SECRET={}", secret)
    .map_err(|e| AppError::Config(format!("Unable to persist JWT_SECRET: {}", e)))?;
  Ok(())
}
