// src/models/promo_code.rs

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PromoCode {
  pub id: i64,
  pub code: String,
  /// "percentage" or "fixed"
  pub discount_type: String,
  pub value: f64,
  pub min_subtotal: f64,
  pub active: bool,
}
