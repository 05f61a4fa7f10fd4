// src/services/mod.rs

//! Domain services shared by the HTTP handlers.

pub mod auth_service;
pub mod order_service;
pub mod pricing;
pub mod tokens;
