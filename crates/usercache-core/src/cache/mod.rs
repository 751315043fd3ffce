//! Local caching module for offline data access.
//!
//! `UserStore` is the storage contract the sync repository relies on.
//! `UserCache` implements it with an id-ordered table that is persisted as
//! JSON under the cache directory (or kept purely in memory).

pub mod manager;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::User;

pub use manager::{CachedData, UserCache};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache data is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable storage of user records keyed by id.
///
/// An upsert is atomic per record: a concurrent reader sees either the old
/// or the new value.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert(&self, user: &User) -> Result<(), StoreError>;

    async fn upsert_many(&self, users: &[User]) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Up to `limit` users after skipping `skip`, ordered by id ascending
    async fn get_page(&self, limit: u32, skip: u32) -> Result<Vec<User>, StoreError>;

    async fn count(&self) -> Result<u32, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}
