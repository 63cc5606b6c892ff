//! Business logic services.

pub mod artifact_filter;
pub mod artifact_service;
pub mod auth_service;
pub mod inventory;
pub mod stats_service;
pub mod user_service;
