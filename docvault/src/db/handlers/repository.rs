//! Base repository trait for database operations.

use crate::db::errors::Result;

/// Base repository trait providing common database operations.
///
/// A repository is the data access layer for one table. It has separate
/// associated types for create requests, update requests, and responses so
/// the storage representation never leaks into the API layer.
///
/// `Users` intentionally does not implement this trait: user accounts are
/// never hard-deleted, so the user repository exposes its own narrower set
/// of inherent methods instead.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities matching the filter
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Update an entity by ID
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;

    /// Delete an entity by ID; returns whether a row was removed
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;
}
