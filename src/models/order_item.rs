// src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: i64,
  pub order_id: i64,
  // Soft reference: the product row may be deleted later (SET NULL),
  // leaving the captured quantity/price intact.
  pub product_id: Option<i64>,
  pub quantity: i64,
  // Price captured at order time; never re-derived from the live product.
  pub price: f64,
  pub selected_color: Option<String>,
}
