// src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};

use crate::errors::AppError;

pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
  Returned,
  Refunded,
}

impl OrderStatus {
  /// Parses an incoming status string, rejecting anything outside the enum.
  pub fn parse(s: &str) -> Result<Self, AppError> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "processing" => Ok(OrderStatus::Processing),
      "shipped" => Ok(OrderStatus::Shipped),
      "delivered" => Ok(OrderStatus::Delivered),
      "cancelled" => Ok(OrderStatus::Cancelled),
      "returned" => Ok(OrderStatus::Returned),
      "refunded" => Ok(OrderStatus::Refunded),
      other => Err(AppError::Validation(format!("Invalid order status: {}", other))),
    }
  }

  /// Cancellation is only open to orders that have not left the warehouse.
  pub fn is_cancellable(self) -> bool {
    matches!(self, OrderStatus::Pending | OrderStatus::Processing)
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: i64,
  pub user_id: Option<i64>,
  pub guest_email: Option<String>,
  pub guest_name: Option<String>,
  pub status: OrderStatus,
  pub subtotal: f64,
  pub discount: f64,
  pub shipping_cost: f64,
  pub total: f64,
  pub shipping_address: String,
  pub billing_address: String,
  pub payment_method: String,
  pub payment_details: Option<String>,
  pub cancellation_reason: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Order {
  pub fn order_number(&self) -> String {
    format_order_number(self.id)
  }
}

/// Display number for an order row: `ORD-` + id zero-padded to six digits.
/// Not stored; always derived from the row id.
pub fn format_order_number(id: i64) -> String {
  format!("{}{:06}", ORDER_NUMBER_PREFIX, id)
}

/// Recovers the row id from a display order number (`ORD-000042` -> 42).
pub fn parse_order_number(order_number: &str) -> Result<i64, AppError> {
  order_number
    .strip_prefix(ORDER_NUMBER_PREFIX)
    .and_then(|digits| digits.parse::<i64>().ok())
    .filter(|id| *id > 0)
    .ok_or_else(|| AppError::Validation(format!("Invalid order number: {}", order_number)))
}
