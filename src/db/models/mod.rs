//! Database-facing request/response structs.

pub mod repos;
pub mod reviews;
pub mod users;
