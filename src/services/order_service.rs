// src/services/order_service.rs

//! Transactional order persistence: the header row and every line item
//! commit together or not at all.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::models::order::format_order_number;

#[derive(Debug, Clone)]
pub struct NewOrderItem {
  pub product_id: Option<i64>,
  pub quantity: i64,
  pub price: f64,
  pub selected_color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: Option<i64>,
  pub guest_email: Option<String>,
  pub guest_name: Option<String>,
  pub subtotal: f64,
  pub discount: f64,
  pub shipping_cost: f64,
  pub total: f64,
  pub shipping_address: serde_json::Value,
  pub billing_address: Option<serde_json::Value>,
  pub payment_method: String,
  pub payment_details: Option<serde_json::Value>,
  pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct CreatedOrder {
  pub id: i64,
  pub order_number: String,
  pub created_at: DateTime<Utc>,
}

/// Persists an order header and its line items in a single transaction.
///
/// Totals are stored exactly as supplied; there is no price recomputation
/// and no stock reservation here, so two identical submissions produce two
/// distinct orders. Any failed insert rolls the whole attempt back.
#[instrument(name = "order_service::create_order", skip(pool, new_order), fields(item_count = new_order.items.len()))]
pub async fn create_order(pool: &SqlitePool, new_order: NewOrder) -> Result<CreatedOrder> {
  if new_order.items.is_empty() {
    return Err(AppError::Validation("Order must contain at least one item".to_string()));
  }

  let shipping_address = serde_json::to_string(&new_order.shipping_address)
    .map_err(|e| AppError::Internal(format!("Unserializable shipping address: {}", e)))?;
  // Billing falls back to a copy of shipping only when wholly absent.
  let billing_address = match &new_order.billing_address {
    Some(billing) => serde_json::to_string(billing)
      .map_err(|e| AppError::Internal(format!("Unserializable billing address: {}", e)))?,
    None => shipping_address.clone(),
  };
  let payment_details = match &new_order.payment_details {
    Some(details) => Some(
      serde_json::to_string(details)
        .map_err(|e| AppError::Internal(format!("Unserializable payment details: {}", e)))?,
    ),
    None => None,
  };

  let created_at = Utc::now();

  // Rollback on any early return is handled by the transaction drop guard.
  let mut tx = pool.begin().await?;

  let order_id = sqlx::query(
    r#"
    INSERT INTO orders
      (user_id, guest_email, guest_name, status, subtotal, discount, shipping_cost, total,
       shipping_address, billing_address, payment_method, payment_details, created_at)
    VALUES (?, ?, ?, 'pending', ?, ?, ?, ?, ?, ?, ?, ?, ?)
    "#,
  )
  .bind(new_order.user_id)
  .bind(&new_order.guest_email)
  .bind(&new_order.guest_name)
  .bind(new_order.subtotal)
  .bind(new_order.discount)
  .bind(new_order.shipping_cost)
  .bind(new_order.total)
  .bind(&shipping_address)
  .bind(&billing_address)
  .bind(&new_order.payment_method)
  .bind(&payment_details)
  .bind(created_at)
  .execute(&mut *tx)
  .await?
  .last_insert_rowid();

  for item in &new_order.items {
    sqlx::query(
      r#"
      INSERT INTO order_items (order_id, product_id, quantity, price, selected_color)
      VALUES (?, ?, ?, ?, ?)
      "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price)
    .bind(&item.selected_color)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;

  let order_number = format_order_number(order_id);
  info!(order_id, %order_number, "Order persisted");

  Ok(CreatedOrder {
    id: order_id,
    order_number,
    created_at,
  })
}

/// Resolves a guest email to an existing account id, if any. Guest orders
/// matching a registered email are attributed to that account even though
/// the request arrived unauthenticated.
#[instrument(name = "order_service::find_user_id_by_email", skip(pool))]
pub async fn find_user_id_by_email(pool: &SqlitePool, email: &str) -> Result<Option<i64>> {
  let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
    .bind(email)
    .fetch_optional(pool)
    .await?;
  Ok(row.map(|(id,)| id))
}
