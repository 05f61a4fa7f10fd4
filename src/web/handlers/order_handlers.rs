// src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::order::{format_order_number, parse_order_number};
use crate::models::{Order, OrderItem, OrderStatus, PromoCode};
use crate::services::order_service::{self, NewOrder, NewOrderItem};
use crate::services::pricing;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
  /// Product id as held in the client cart.
  pub id: Option<i64>,
  pub price: f64,
  pub quantity: i64,
  pub selected_color: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
  pub items: Option<Vec<OrderItemPayload>>,
  #[serde(default)]
  pub subtotal: f64,
  #[serde(default)]
  pub discount: f64,
  #[serde(default)]
  pub shipping_cost: f64,
  #[serde(default)]
  pub total: f64,
  pub shipping_address: Option<serde_json::Value>,
  pub billing_address: Option<serde_json::Value>,
  pub payment_method: Option<String>,
  pub payment_details: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
pub struct GuestInfoPayload {
  pub email: Option<String>,
  pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuestOrderPayload {
  pub user_info: Option<GuestInfoPayload>,
  #[serde(flatten)]
  pub order: CreateOrderPayload,
}

#[derive(Deserialize, Debug)]
pub struct ListOrdersQuery {
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TrackOrderQuery {
  pub order_number: String,
  pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct CancelOrderPayload {
  pub reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusPayload {
  pub status: String,
}

#[derive(Deserialize, Debug)]
pub struct ValidatePromoPayload {
  pub code: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CalculateShippingPayload {
  pub postal_code: Option<String>,
  pub country: Option<String>,
  #[serde(default)]
  pub subtotal: f64,
}

// --- Shared helpers ---

/// Payload checks shared by the registered and guest creation paths.
fn validate_order_payload(payload: &CreateOrderPayload) -> Result<(), AppError> {
  match &payload.items {
    None => return Err(AppError::Validation("Order items are required".to_string())),
    Some(items) if items.is_empty() => {
      return Err(AppError::Validation("Order items are required".to_string()));
    }
    Some(_) => {}
  }
  if payload.shipping_address.is_none() {
    return Err(AppError::Validation("Shipping address is required".to_string()));
  }
  Ok(())
}

fn build_new_order(
  payload: CreateOrderPayload,
  user_id: Option<i64>,
  guest_email: Option<String>,
  guest_name: Option<String>,
) -> NewOrder {
  let items = payload
    .items
    .unwrap_or_default()
    .into_iter()
    .map(|item| NewOrderItem {
      product_id: item.id,
      quantity: item.quantity,
      price: item.price,
      selected_color: item.selected_color,
    })
    .collect();

  NewOrder {
    user_id,
    guest_email,
    guest_name,
    subtotal: payload.subtotal,
    discount: payload.discount,
    shipping_cost: payload.shipping_cost,
    total: payload.total,
    shipping_address: payload.shipping_address.unwrap_or(serde_json::Value::Null),
    billing_address: payload.billing_address,
    payment_method: payload.payment_method.unwrap_or_else(|| "card".to_string()),
    payment_details: payload.payment_details,
    items,
  }
}

fn address_json(raw: &str) -> serde_json::Value {
  serde_json::from_str(raw).unwrap_or(serde_json::Value::Null)
}

fn order_json(order: &Order) -> serde_json::Value {
  json!({
    "id": order.id,
    "orderNumber": order.order_number(),
    "status": order.status,
    "subtotal": order.subtotal,
    "discount": order.discount,
    "shippingCost": order.shipping_cost,
    "total": order.total,
    "shippingAddress": address_json(&order.shipping_address),
    "billingAddress": address_json(&order.billing_address),
    "paymentMethod": order.payment_method,
    "cancellationReason": order.cancellation_reason,
    "createdAt": order.created_at,
  })
}

fn item_json(item: &OrderItem) -> serde_json::Value {
  json!({
    "id": item.id,
    "productId": item.product_id,
    "quantity": item.quantity,
    "price": item.price,
    "selectedColor": item.selected_color,
  })
}

fn created_response(payload_totals: (f64, f64, f64, f64), created: &order_service::CreatedOrder) -> HttpResponse {
  let (subtotal, discount, shipping_cost, total) = payload_totals;
  HttpResponse::Created().json(json!({
    "id": created.id,
    "orderNumber": created.order_number,
    "status": OrderStatus::Pending,
    "subtotal": subtotal,
    "discount": discount,
    "shippingCost": shipping_cost,
    "total": total,
    "createdAt": created.created_at,
  }))
}

// --- Handler Implementations ---

#[instrument(
  name = "handler::create_order",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CreateOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  validate_order_payload(&payload)?;

  let totals = (payload.subtotal, payload.discount, payload.shipping_cost, payload.total);
  let new_order = build_new_order(payload, Some(auth_user.user_id), None, None);

  let created = order_service::create_order(&app_state.db_pool, new_order).await?;
  info!(
    "Order {} created for user {}.",
    created.order_number, auth_user.user_id
  );

  Ok(created_response(totals, &created))
}

#[instrument(name = "handler::create_guest_order", skip(app_state, req_payload))]
pub async fn create_guest_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CreateGuestOrderPayload>,
) -> Result<HttpResponse, AppError> {
  let CreateGuestOrderPayload { user_info, order } = req_payload.into_inner();
  validate_order_payload(&order)?;

  let guest_email = user_info
    .as_ref()
    .and_then(|info| info.email.clone())
    .filter(|email| !email.is_empty())
    .ok_or_else(|| AppError::Validation("Guest email is required".to_string()))?;
  let guest_name = user_info.as_ref().and_then(|info| info.name.clone());

  // Identity inference by email match: a guest order whose email belongs to
  // a registered account is attributed to that account, while the guest
  // fields are stored either way.
  let matched_user_id = order_service::find_user_id_by_email(&app_state.db_pool, &guest_email).await?;
  if let Some(user_id) = matched_user_id {
    info!("Guest order email {} matched registered user {}.", guest_email, user_id);
  }

  let totals = (order.subtotal, order.discount, order.shipping_cost, order.total);
  let new_order = build_new_order(order, matched_user_id, Some(guest_email), guest_name);

  let created = order_service::create_order(&app_state.db_pool, new_order).await?;
  info!("Guest order {} created.", created.order_number);

  Ok(created_response(totals, &created))
}

#[instrument(
  name = "handler::list_orders",
  skip(app_state, query, auth_user),
  fields(user_id = %auth_user.user_id)
)]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListOrdersQuery>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let page = query.page.unwrap_or(1).max(1);
  let limit = query.limit.unwrap_or(10).clamp(1, 100);
  let offset = (page - 1) * limit;

  let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = ?")
    .bind(auth_user.user_id)
    .fetch_one(&app_state.db_pool)
    .await?;

  let orders: Vec<Order> = sqlx::query_as(
    "SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
  )
  .bind(auth_user.user_id)
  .bind(limit)
  .bind(offset)
  .fetch_all(&app_state.db_pool)
  .await?;

  let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

  Ok(HttpResponse::Ok().json(json!({
    "pagination": {
      "page": page,
      "limit": limit,
      "total": total,
      "totalPages": total_pages,
    },
    "orders": orders.iter().map(order_json).collect::<Vec<_>>(),
  })))
}

#[instrument(
  name = "handler::get_order",
  skip(app_state, path, auth_user),
  fields(user_id = %auth_user.user_id)
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();

  // Scoped to the requesting user: a foreign id reads as not-found, never
  // as forbidden, so order ids are not enumerable.
  let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = ? AND user_id = ?")
    .bind(order_id)
    .bind(auth_user.user_id)
    .fetch_optional(&app_state.db_pool)
    .await?;

  let order = order.ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

  let items: Vec<OrderItem> = sqlx::query_as("SELECT * FROM order_items WHERE order_id = ?")
    .bind(order.id)
    .fetch_all(&app_state.db_pool)
    .await?;

  let mut body = order_json(&order);
  body["items"] = items.iter().map(item_json).collect::<Vec<_>>().into();
  Ok(HttpResponse::Ok().json(body))
}

#[instrument(
  name = "handler::cancel_order",
  skip(app_state, path, req_payload, auth_user),
  fields(user_id = %auth_user.user_id)
)]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  req_payload: web::Json<CancelOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();

  let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = ? AND user_id = ?")
    .bind(order_id)
    .bind(auth_user.user_id)
    .fetch_optional(&app_state.db_pool)
    .await?;
  let order = order.ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

  if !order.status.is_cancellable() {
    warn!(
      "Cancel rejected for order {}: status is {:?}.",
      order.order_number(),
      order.status
    );
    return Err(AppError::Validation(
      "Only pending or processing orders can be cancelled".to_string(),
    ));
  }

  sqlx::query("UPDATE orders SET status = 'cancelled', cancellation_reason = ? WHERE id = ?")
    .bind(&req_payload.reason)
    .bind(order.id)
    .execute(&app_state.db_pool)
    .await?;

  info!("Order {} cancelled.", order.order_number());

  Ok(HttpResponse::Ok().json(json!({
    "message": "Order cancelled successfully.",
    "id": order.id,
    "orderNumber": order.order_number(),
    "status": OrderStatus::Cancelled,
  })))
}

#[instrument(name = "handler::track_order", skip(app_state, query))]
pub async fn track_order_handler(
  app_state: web::Data<AppState>,
  query: web::Query<TrackOrderQuery>,
) -> Result<HttpResponse, AppError> {
  let order_id = parse_order_number(&query.order_number)
    .map_err(|_| AppError::NotFound("Order not found".to_string()))?;

  // Matches either the stored guest email or the owning account's email.
  let order: Option<Order> = sqlx::query_as(
    r#"
    SELECT o.* FROM orders o
    LEFT JOIN users u ON u.id = o.user_id
    WHERE o.id = ?1 AND (o.guest_email = ?2 OR u.email = ?2)
    "#,
  )
  .bind(order_id)
  .bind(&query.email)
  .fetch_optional(&app_state.db_pool)
  .await?;

  let order = order.ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

  let items: Vec<OrderItem> = sqlx::query_as("SELECT * FROM order_items WHERE order_id = ?")
    .bind(order.id)
    .fetch_all(&app_state.db_pool)
    .await?;

  // Limited summary only: the tracking page never sees addresses.
  Ok(HttpResponse::Ok().json(json!({
    "orderNumber": format_order_number(order.id),
    "status": order.status,
    "total": order.total,
    "createdAt": order.created_at,
    "items": items.iter().map(item_json).collect::<Vec<_>>(),
  })))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, path, req_payload, admin),
  fields(admin_id = %admin.0.user_id)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  req_payload: web::Json<UpdateStatusPayload>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let status = OrderStatus::parse(&req_payload.status)?;

  let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
    .bind(status)
    .bind(order_id)
    .execute(&app_state.db_pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("Order {} not found", order_id)));
  }

  info!("Order {} status set to {:?}.", format_order_number(order_id), status);

  Ok(HttpResponse::Ok().json(json!({
    "id": order_id,
    "orderNumber": format_order_number(order_id),
    "status": status,
  })))
}

#[instrument(name = "handler::validate_promo_code", skip(app_state, req_payload))]
pub async fn validate_promo_code_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<ValidatePromoPayload>,
) -> Result<HttpResponse, AppError> {
  let code = req_payload
    .code
    .as_deref()
    .map(str::trim)
    .filter(|code| !code.is_empty())
    .ok_or_else(|| AppError::Validation("Promo code is required".to_string()))?;

  let promo: Option<PromoCode> = sqlx::query_as("SELECT * FROM promo_codes WHERE code = ? AND active = 1")
    .bind(code)
    .fetch_optional(&app_state.db_pool)
    .await?;

  let promo = promo.ok_or_else(|| AppError::NotFound("Invalid promo code".to_string()))?;

  Ok(HttpResponse::Ok().json(json!({
    "code": promo.code,
    "discountType": promo.discount_type,
    "value": promo.value,
    "minSubtotal": promo.min_subtotal,
  })))
}

#[instrument(name = "handler::calculate_shipping", skip(req_payload))]
pub async fn calculate_shipping_handler(
  req_payload: web::Json<CalculateShippingPayload>,
) -> Result<HttpResponse, AppError> {
  let shipping_cost = pricing::shipping_cost(req_payload.subtotal);

  Ok(HttpResponse::Ok().json(json!({
    "shippingCost": shipping_cost,
    "freeShippingThreshold": pricing::FREE_SHIPPING_THRESHOLD,
    "freeShipping": shipping_cost == 0.0,
  })))
}
