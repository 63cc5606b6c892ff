//! Museum collection management backend.
//!
//! REST API over Postgres for an artifact catalog with inventory
//! consistency rules, dashboard statistics, a user directory and
//! role-based access control.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
