// src/services/pricing.rs

//! Shipping cost policy: flat rate with free shipping over a threshold.

pub const FLAT_SHIPPING_RATE: f64 = 99.0;
pub const FREE_SHIPPING_THRESHOLD: f64 = 999.0;

pub fn shipping_cost(subtotal: f64) -> f64 {
  if subtotal >= FREE_SHIPPING_THRESHOLD {
    0.0
  } else {
    FLAT_SHIPPING_RATE
  }
}
