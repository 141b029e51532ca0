//! Database layer: repository-pattern data access over Postgres.

pub mod errors;
pub mod handlers;
pub mod models;
