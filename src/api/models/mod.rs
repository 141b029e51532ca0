//! Wire-facing request/response schemas.

pub mod auth;
pub mod repos;
pub mod reviews;
pub mod users;
