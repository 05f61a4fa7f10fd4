// src/models/mod.rs

//! Data structures representing database entities.

pub mod order;
pub mod order_item;
pub mod promo_code;
pub mod user;

pub use order::{Order, OrderStatus};
pub use order_item::OrderItem;
pub use promo_code::PromoCode;
pub use user::User;
