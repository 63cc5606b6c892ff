//! Database models (SQLx).

pub mod artifact;
pub mod user;
