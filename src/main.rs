// src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use gaia_commerce::config::AppConfig;
use gaia_commerce::db;
use gaia_commerce::state::AppState;
use gaia_commerce::web::configure_app_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting GAIA commerce server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  let db_pool = match db::connect(&app_config.db_path).await {
    Ok(pool) => {
      tracing::info!(db_path = %app_config.db_path, "Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      panic!("Database connection error: {}", e);
    }
  };

  if let Err(e) = db::init_schema(&db_pool).await {
    tracing::error!(error = %e, "Failed to initialize database schema.");
    panic!("Schema initialization error: {}", e);
  }

  let app_state = AppState {
    db_pool: db_pool.clone(),
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
