// src/web/routes.rs

use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called from `main.rs` (and the integration tests) to configure the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/signup", web::post().to(crate::web::handlers::auth_handlers::signup_handler))
          .route("/signin", web::post().to(crate::web::handlers::auth_handlers::signin_handler)),
      )
      .service(
        web::scope("/orders")
          // Literal segments are registered ahead of `{id}` so that
          // `/orders/track` never resolves as an order id.
          .route(
            "/guest",
            web::post().to(crate::web::handlers::order_handlers::create_guest_order_handler),
          )
          .route(
            "/track",
            web::get().to(crate::web::handlers::order_handlers::track_order_handler),
          )
          .route(
            "/promo-code/validate",
            web::post().to(crate::web::handlers::order_handlers::validate_promo_code_handler),
          )
          .route(
            "/shipping/calculate",
            web::post().to(crate::web::handlers::order_handlers::calculate_shipping_handler),
          )
          .route("", web::post().to(crate::web::handlers::order_handlers::create_order_handler))
          .route("", web::get().to(crate::web::handlers::order_handlers::list_orders_handler))
          .route(
            "/{id}",
            web::get().to(crate::web::handlers::order_handlers::get_order_handler),
          )
          .route(
            "/{id}/cancel",
            web::put().to(crate::web::handlers::order_handlers::cancel_order_handler),
          )
          .route(
            "/{id}/status",
            web::put().to(crate::web::handlers::order_handlers::update_order_status_handler),
          ),
      ),
  );
}
