// src/services/tokens.rs

//! Bearer token issuance and validation (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::User;

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// User row id.
  pub sub: i64,
  pub email: String,
  pub admin: bool,
  pub iat: i64,
  pub exp: i64,
}

pub fn issue_token(user: &User, secret: &str) -> Result<String, AppError> {
  let now = Utc::now();
  let claims = Claims {
    sub: user.id,
    email: user.email.clone(),
    admin: user.is_admin,
    iat: now.timestamp(),
    exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
  };

  encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
  decode::<Claims>(
    token,
    &DecodingKey::from_secret(secret.as_bytes()),
    &Validation::default(),
  )
  .map(|data| data.claims)
  .map_err(|e| AppError::Auth(format!("Invalid or expired token: {}", e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn test_user(is_admin: bool) -> User {
    User {
      id: 9,
      email: "ada@example.com".to_string(),
      name: Some("Ada".to_string()),
      password_hash: String::new(),
      is_admin,
      created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  #[test]
  fn issue_then_verify_round_trip() {
    let token = issue_token(&test_user(true), "secret").unwrap();
    let claims = verify_token(&token, "secret").unwrap();
    assert_eq!(claims.sub, 9);
    assert_eq!(claims.email, "ada@example.com");
    assert!(claims.admin);
  }

  #[test]
  fn wrong_secret_rejected() {
    let token = issue_token(&test_user(false), "secret").unwrap();
    assert!(verify_token(&token, "other-secret").is_err());
  }

  #[test]
  fn garbage_token_rejected() {
    assert!(verify_token("not.a.token", "secret").is_err());
  }
}
