//! Authentication: password hashing, JWT sessions, request extractors.

mod current_user;
pub mod password;
mod review_auth;
pub mod session;

pub use review_auth::ReviewAuth;
