// tests/orders_api.rs

mod common;

use actix_web::{http::StatusCode, test, web, App};
use serial_test::serial;

use common::*;
use gaia_commerce::checkout::{CartLine, CheckoutWizard, Session};
use gaia_commerce::web::configure_app_routes;

macro_rules! test_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

#[actix_web::test]
#[serial]
async fn create_order_persists_header_and_single_line_item() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;
  let user = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("Authorization", bearer_for(&user)))
    .set_json(single_line_order_payload())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let body: serde_json::Value = test::read_body_json(resp).await;
  assert_eq!(body["orderNumber"], "ORD-000001");
  assert_eq!(body["status"], "pending");
  assert_eq!(body["subtotal"], 998.0);
  assert_eq!(body["shippingCost"], 0.0);
  assert_eq!(body["total"], 998.0);
  assert!(body["createdAt"].is_string());

  assert_eq!(count(&state.db_pool, "orders").await, 1);
  assert_eq!(count(&state.db_pool, "order_items").await, 1);
  let (product_id, quantity, price): (i64, i64, f64) =
    sqlx::query_as("SELECT product_id, quantity, price FROM order_items WHERE order_id = 1")
      .fetch_one(&state.db_pool)
      .await
      .unwrap();
  assert_eq!(product_id, 7);
  assert_eq!(quantity, 2);
  assert_eq!(price, 499.0);
}

#[actix_web::test]
#[serial]
async fn create_order_rejects_missing_items_or_address() {
  let state = test_state().await;
  let app = test_app!(state);
  let user = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;

  for payload in [
    // items absent
    serde_json::json!({"shippingAddress": {"fullName": "A"}}),
    // items empty
    serde_json::json!({"items": [], "shippingAddress": {"fullName": "A"}}),
    // shipping address absent
    serde_json::json!({"items": [{"id": 7, "price": 499.0, "quantity": 1}]}),
  ] {
    let req = test::TestRequest::post()
      .uri("/api/orders")
      .insert_header(("Authorization", bearer_for(&user)))
      .set_json(payload)
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }
  assert_eq!(count(&state.db_pool, "orders").await, 0);
}

#[actix_web::test]
#[serial]
async fn duplicate_submission_creates_two_distinct_orders() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;
  let user = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;

  let mut ids = Vec::new();
  for _ in 0..2 {
    let req = test::TestRequest::post()
      .uri("/api/orders")
      .insert_header(("Authorization", bearer_for(&user)))
      .set_json(single_line_order_payload())
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    ids.push(body["id"].as_i64().unwrap());
  }

  // no idempotency key exists: the same payload lands twice
  assert_ne!(ids[0], ids[1]);
  assert_eq!(count(&state.db_pool, "orders").await, 2);
}

#[actix_web::test]
#[serial]
async fn failed_line_item_rolls_back_the_whole_order() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;
  let user = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;

  // second line references a product id that does not exist, violating the
  // foreign key once enforcement is on
  let payload = serde_json::json!({
    "items": [
      {"id": 7, "price": 499.0, "quantity": 2},
      {"id": 9999, "price": 120.0, "quantity": 1}
    ],
    "subtotal": 1118.0,
    "total": 1118.0,
    "shippingAddress": {"fullName": "A"},
    "paymentMethod": "cod"
  });
  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("Authorization", bearer_for(&user)))
    .set_json(payload)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

  // all-or-nothing: neither the header nor the first line survived
  assert_eq!(count(&state.db_pool, "orders").await, 0);
  assert_eq!(count(&state.db_pool, "order_items").await, 0);
}

#[actix_web::test]
#[serial]
async fn guest_order_attributes_matching_registered_email() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;
  let user = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;

  let mut payload = single_line_order_payload();
  payload["userInfo"] = serde_json::json!({"email": "asha@example.com", "name": "Asha (guest)"});
  let req = test::TestRequest::post()
    .uri("/api/orders/guest")
    .set_json(payload)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let (user_id, guest_email, guest_name): (Option<i64>, Option<String>, Option<String>) =
    sqlx::query_as("SELECT user_id, guest_email, guest_name FROM orders WHERE id = 1")
      .fetch_one(&state.db_pool)
      .await
      .unwrap();
  // attributed by email match, guest fields persisted regardless
  assert_eq!(user_id, Some(user.id));
  assert_eq!(guest_email.as_deref(), Some("asha@example.com"));
  assert_eq!(guest_name.as_deref(), Some("Asha (guest)"));
}

#[actix_web::test]
#[serial]
async fn guest_order_requires_email() {
  let state = test_state().await;
  let app = test_app!(state);

  let mut payload = single_line_order_payload();
  payload["userInfo"] = serde_json::json!({"name": "Nameless"});
  let req = test::TestRequest::post()
    .uri("/api/orders/guest")
    .set_json(payload)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn billing_address_defaults_to_shipping_but_keeps_empty_object() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;
  let user = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;

  // absent billing address: server copies shipping
  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("Authorization", bearer_for(&user)))
    .set_json(single_line_order_payload())
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  // explicit empty object (the unchecked "same as shipping" gap): stored as-is
  let mut payload = single_line_order_payload();
  payload["billingAddress"] = serde_json::json!({});
  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("Authorization", bearer_for(&user)))
    .set_json(payload)
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  let rows: Vec<(String, String)> = sqlx::query_as("SELECT shipping_address, billing_address FROM orders ORDER BY id")
    .fetch_all(&state.db_pool)
    .await
    .unwrap();
  assert_eq!(rows[0].0, rows[0].1);
  assert_eq!(rows[1].1, "{}");
}

#[actix_web::test]
#[serial]
async fn get_order_is_scoped_to_its_owner() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;
  let owner = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;
  let other = seed_user(&state.db_pool, "noor@example.com", "Noor", false).await;

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("Authorization", bearer_for(&owner)))
    .set_json(single_line_order_payload())
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  // a foreign id reads as not-found, never forbidden
  let req = test::TestRequest::get()
    .uri("/api/orders/1")
    .insert_header(("Authorization", bearer_for(&other)))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::get()
    .uri("/api/orders/1")
    .insert_header(("Authorization", bearer_for(&owner)))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: serde_json::Value = test::read_body_json(resp).await;
  assert_eq!(body["orderNumber"], "ORD-000001");
  assert_eq!(body["items"].as_array().unwrap().len(), 1);
  assert_eq!(body["items"][0]["productId"], 7);
}

#[actix_web::test]
#[serial]
async fn list_orders_paginates_newest_first() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;
  let user = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;

  for _ in 0..3 {
    let req = test::TestRequest::post()
      .uri("/api/orders")
      .insert_header(("Authorization", bearer_for(&user)))
      .set_json(single_line_order_payload())
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
  }

  let req = test::TestRequest::get()
    .uri("/api/orders?page=1&limit=2")
    .insert_header(("Authorization", bearer_for(&user)))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: serde_json::Value = test::read_body_json(resp).await;
  assert_eq!(body["pagination"]["page"], 1);
  assert_eq!(body["pagination"]["limit"], 2);
  assert_eq!(body["pagination"]["total"], 3);
  assert_eq!(body["pagination"]["totalPages"], 2);
  let orders = body["orders"].as_array().unwrap();
  assert_eq!(orders.len(), 2);
  assert_eq!(orders[0]["id"], 3);
}

#[actix_web::test]
#[serial]
async fn cancellation_guard_depends_on_status() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;
  let user = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;

  for _ in 0..2 {
    let req = test::TestRequest::post()
      .uri("/api/orders")
      .insert_header(("Authorization", bearer_for(&user)))
      .set_json(single_line_order_payload())
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
  }
  sqlx::query("UPDATE orders SET status = 'shipped' WHERE id = 2")
    .execute(&state.db_pool)
    .await
    .unwrap();

  // pending order cancels and records the reason
  let req = test::TestRequest::put()
    .uri("/api/orders/1/cancel")
    .insert_header(("Authorization", bearer_for(&user)))
    .set_json(serde_json::json!({"reason": "Changed my mind"}))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let (status, reason): (String, Option<String>) =
    sqlx::query_as("SELECT status, cancellation_reason FROM orders WHERE id = 1")
      .fetch_one(&state.db_pool)
      .await
      .unwrap();
  assert_eq!(status, "cancelled");
  assert_eq!(reason.as_deref(), Some("Changed my mind"));

  // shipped order refuses cancellation
  let req = test::TestRequest::put()
    .uri("/api/orders/2/cancel")
    .insert_header(("Authorization", bearer_for(&user)))
    .set_json(serde_json::json!({"reason": "Too late"}))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn track_order_round_trips_the_display_number() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;

  let mut payload = single_line_order_payload();
  payload["userInfo"] = serde_json::json!({"email": "guest@example.com", "name": "Guest"});
  let req = test::TestRequest::post()
    .uri("/api/orders/guest")
    .set_json(payload)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: serde_json::Value = test::read_body_json(resp).await;
  let order_number = body["orderNumber"].as_str().unwrap().to_string();

  let req = test::TestRequest::get()
    .uri(&format!(
      "/api/orders/track?orderNumber={}&email=guest@example.com",
      order_number
    ))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: serde_json::Value = test::read_body_json(resp).await;
  assert_eq!(body["orderNumber"], order_number.as_str());
  assert_eq!(body["status"], "pending");
  // tracking is a limited view: no addresses leak through it
  assert!(body.get("shippingAddress").is_none());

  // mismatched email and malformed numbers both read as not-found
  let req = test::TestRequest::get()
    .uri(&format!(
      "/api/orders/track?orderNumber={}&email=wrong@example.com",
      order_number
    ))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
  let req = test::TestRequest::get()
    .uri("/api/orders/track?orderNumber=BAD-1&email=guest@example.com")
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[serial]
async fn status_update_is_admin_only_and_enum_checked() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;
  let user = seed_user(&state.db_pool, "asha@example.com", "Asha", false).await;
  let admin = seed_user(&state.db_pool, "root@example.com", "Root", true).await;

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("Authorization", bearer_for(&user)))
    .set_json(single_line_order_payload())
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  // non-admin is refused outright
  let req = test::TestRequest::put()
    .uri("/api/orders/1/status")
    .insert_header(("Authorization", bearer_for(&user)))
    .set_json(serde_json::json!({"status": "processing"}))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  // unknown enum value is a 400
  let req = test::TestRequest::put()
    .uri("/api/orders/1/status")
    .insert_header(("Authorization", bearer_for(&admin)))
    .set_json(serde_json::json!({"status": "teleported"}))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::put()
    .uri("/api/orders/1/status")
    .insert_header(("Authorization", bearer_for(&admin)))
    .set_json(serde_json::json!({"status": "processing"}))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let (status,): (String,) = sqlx::query_as("SELECT status FROM orders WHERE id = 1")
    .fetch_one(&state.db_pool)
    .await
    .unwrap();
  assert_eq!(status, "processing");
}

#[actix_web::test]
#[serial]
async fn promo_code_lookup_is_case_insensitive() {
  let state = test_state().await;
  let app = test_app!(state);
  sqlx::query("INSERT INTO promo_codes (code, discount_type, value, min_subtotal) VALUES ('WELCOME10', 'percentage', 10, 0)")
    .execute(&state.db_pool)
    .await
    .unwrap();

  let req = test::TestRequest::post()
    .uri("/api/orders/promo-code/validate")
    .set_json(serde_json::json!({"code": "welcome10"}))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: serde_json::Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "WELCOME10");
  assert_eq!(body["discountType"], "percentage");
  assert_eq!(body["value"], 10.0);

  let req = test::TestRequest::post()
    .uri("/api/orders/promo-code/validate")
    .set_json(serde_json::json!({"code": "NOPE"}))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[serial]
async fn shipping_calculation_honors_the_free_threshold() {
  let state = test_state().await;
  let app = test_app!(state);

  let req = test::TestRequest::post()
    .uri("/api/orders/shipping/calculate")
    .set_json(serde_json::json!({"postalCode": "411001", "country": "IN", "subtotal": 500.0}))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: serde_json::Value = test::read_body_json(resp).await;
  assert_eq!(body["shippingCost"], 99.0);
  assert_eq!(body["freeShipping"], false);

  let req = test::TestRequest::post()
    .uri("/api/orders/shipping/calculate")
    .set_json(serde_json::json!({"subtotal": 1200.0}))
    .to_request();
  let resp = test::call_service(&app, req).await;
  let body: serde_json::Value = test::read_body_json(resp).await;
  assert_eq!(body["shippingCost"], 0.0);
  assert_eq!(body["freeShipping"], true);
}

#[actix_web::test]
#[serial]
async fn wizard_payload_is_accepted_end_to_end() {
  let state = test_state().await;
  let app = test_app!(state);
  seed_product(&state.db_pool, 7, "Rosehip Face Oil", 499.0).await;

  let mut wizard = CheckoutWizard::new(
    vec![CartLine {
      product_id: 7,
      name: "Rosehip Face Oil".to_string(),
      price: 499.0,
      quantity: 2,
      selected_color: Some("Coral".to_string()),
    }],
    Session::Guest,
  )
  .unwrap();
  wizard.set_shipping_value("fullName", "Guest Shopper");
  wizard.set_shipping_value("email", "guest@example.com");
  wizard.set_shipping_value("phone", "9876543210");
  wizard.set_shipping_value("address", "14 Lotus Lane");
  wizard.set_shipping_value("city", "Pune");
  wizard.set_shipping_value("state", "MH");
  wizard.set_shipping_value("postalCode", "411001");
  assert!(wizard.proceed_to_payment());
  wizard.set_payment_value("paymentMethod", "cod");
  let payload = wizard.build_payload().unwrap();

  let req = test::TestRequest::post()
    .uri(wizard.submit_path())
    .set_json(serde_json::to_value(&payload).unwrap())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: serde_json::Value = test::read_body_json(resp).await;

  let number = wizard.complete(&body).unwrap();
  assert_eq!(number, "ORD-000001");
  assert!(wizard.is_order_complete());

  let (selected_color,): (Option<String>,) =
    sqlx::query_as("SELECT selected_color FROM order_items WHERE order_id = 1")
      .fetch_one(&state.db_pool)
      .await
      .unwrap();
  assert_eq!(selected_color.as_deref(), Some("Coral"));
}
