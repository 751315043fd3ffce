//! REST API client module for the remote user directory.
//!
//! `UserSource` is the seam the sync repository depends on; `ApiClient` is
//! its HTTP implementation. Sources never retry: a failed fetch is reported
//! once and the caller decides whether to fall back to the cache.

pub mod client;
pub mod error;

use async_trait::async_trait;

use crate::models::UserPage;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;

/// A remote source of user pages.
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Fetch `limit` users starting at offset `skip`
    async fn fetch_users(&self, limit: u32, skip: u32) -> Result<UserPage, ApiError>;
}
