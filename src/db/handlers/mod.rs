//! Data-access handlers, one per entity.

mod repository;
mod repos;
mod reviews;
mod users;

pub use repository::Repository;
pub use repos::Repos;
pub use reviews::Reviews;
pub use users::Users;
