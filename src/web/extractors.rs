// src/web/extractors.rs

//! Request extractors for authenticated and admin identities.

use actix_web::{web, FromRequest, HttpRequest};
use tracing::warn;

use crate::errors::AppError;
use crate::services::tokens;
use crate::state::AppState;

/// Identity extracted from a `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: i64,
  pub email: String,
  pub is_admin: bool,
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;

  let header = req
    .headers()
    .get("Authorization")
    .and_then(|value| value.to_str().ok())
    .ok_or_else(|| AppError::Auth("Missing Authorization header.".to_string()))?;

  let token = header
    .strip_prefix("Bearer ")
    .ok_or_else(|| AppError::Auth("Authorization header must be a Bearer token.".to_string()))?;

  let claims = tokens::verify_token(token, &state.config.jwt_secret)?;
  Ok(AuthenticatedUser {
    user_id: claims.sub,
    email: claims.email,
    is_admin: claims.admin,
  })
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let result = authenticate(req);
    if let Err(e) = &result {
      warn!(error = %e, "AuthenticatedUser extraction failed");
    }
    futures_util::future::ready(result)
  }
}

/// An authenticated user that additionally carries the admin claim.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let result = authenticate(req).and_then(|user| {
      if user.is_admin {
        Ok(AdminUser(user))
      } else {
        Err(AppError::Forbidden("Admin access required.".to_string()))
      }
    });
    futures_util::future::ready(result)
  }
}
