//! API Routes

pub mod auth;
pub mod customers;
pub mod forms;
pub mod health;
pub mod orders;
pub mod pricing;
pub mod products;
