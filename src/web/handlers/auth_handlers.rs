// src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::User;
use crate::services::{auth_service, tokens};
use crate::state::AppState;

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct SignupRequestPayload {
  pub email: String,
  pub password: String,
  pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
}

fn user_json(user: &User) -> serde_json::Value {
  json!({
    "id": user.id,
    "email": user.email,
    "name": user.name,
    "isAdmin": user.is_admin,
  })
}

// --- Handler Implementations ---

#[instrument(
  name = "handler::signup",
  skip(app_state, req_payload),
  fields(req_email = %req_payload.email)
)]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  info!("Signup attempt for email: {}", req_payload.email);

  if req_payload.email.trim().is_empty() {
    return Err(AppError::Validation("Email is required".to_string()));
  }
  if req_payload.password.len() < 6 {
    return Err(AppError::Validation(
      "Password must be at least 6 characters".to_string(),
    ));
  }

  let password_hash = auth_service::hash_password(&req_payload.password)?;

  let insert_result = sqlx::query("INSERT INTO users (email, name, password_hash) VALUES (?, ?, ?)")
    .bind(&req_payload.email)
    .bind(&req_payload.name)
    .bind(&password_hash)
    .execute(&app_state.db_pool)
    .await;

  let user_id = match insert_result {
    Ok(res) => res.last_insert_rowid(),
    Err(e) => {
      if e
        .as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
      {
        warn!("Signup rejected: email {} already registered.", req_payload.email);
        return Err(AppError::Validation("Email is already registered".to_string()));
      }
      return Err(AppError::Sqlx(e));
    }
  };

  let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
    .bind(user_id)
    .fetch_one(&app_state.db_pool)
    .await?;

  let token = tokens::issue_token(&user, &app_state.config.jwt_secret)?;
  info!("Signup successful for email: {}. User ID: {}", user.email, user.id);

  Ok(HttpResponse::Created().json(json!({
    "message": "User created successfully.",
    "token": token,
    "user": user_json(&user),
  })))
}

#[instrument(
  name = "handler::signin",
  skip(app_state, req_payload),
  fields(req_email = %req_payload.email)
)]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  info!("Signin attempt for email: {}", req_payload.email);

  let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
    .bind(&req_payload.email)
    .fetch_optional(&app_state.db_pool)
    .await?;

  // Same message for unknown email and wrong password.
  let invalid = || AppError::Auth("Invalid email or password".to_string());
  let user = user.ok_or_else(invalid)?;

  if !auth_service::verify_password(&user.password_hash, &req_payload.password)? {
    warn!("Signin failed for email: {}", req_payload.email);
    return Err(invalid());
  }

  let token = tokens::issue_token(&user, &app_state.config.jwt_secret)?;
  info!("Signin successful for email: {}. User ID: {}", user.email, user.id);

  Ok(HttpResponse::Ok().json(json!({
    "message": "Signed in successfully.",
    "token": token,
    "user": user_json(&user),
  })))
}
