// src/lib.rs

//! GAIA Commerce: storefront order service (actix-web + SQLite) together with
//! the client-side checkout workflow and its form-validation rule engine.

pub mod checkout;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod services;
pub mod state;
pub mod web;
