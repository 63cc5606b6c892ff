//! HTTP request handlers, grouped by resource.

pub mod artifacts;
pub mod auth;
pub mod health;
pub mod uploads;
pub mod users;
