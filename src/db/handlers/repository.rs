use async_trait::async_trait;

use crate::db::errors::Result;

/// Common interface for entity data access.
///
/// Handlers borrow a `PgConnection` so callers decide whether operations run
/// inside a transaction. Entity-specific lookups live as inherent methods on
/// the individual handlers.
#[async_trait]
pub trait Repository {
    type CreateRequest: Send + Sync;
    type Response: Send + Sync;
    type Id: Send + Sync;

    /// Insert a new row, returning the stored entity.
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Fetch a row by primary key.
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;
}
