//! Request handlers.

pub mod auth;
pub mod proxy;
pub mod repos;
pub mod reviews;
