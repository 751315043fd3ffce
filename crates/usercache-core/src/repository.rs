//! Sync repository: remote-first reads with write-through caching and cache
//! fallback.
//!
//! Every read asks the connectivity oracle first. Online reads go to the
//! remote source and copy what they get into the local store; any remote
//! failure (transport or server) silently falls back to the store. Only
//! store failures and missing users escape as errors.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::UserSource;
use crate::cache::{StoreError, UserStore};
use crate::connectivity::Connectivity;
use crate::models::{User, UserPage};

/// How many users the online by-id lookup fetches (from offset 0) to search.
/// Ids outside this window are only found if they are already cached.
pub const DEFAULT_LOOKUP_WINDOW: u32 = 100;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("User {0} not found")]
    NotFound(i64),

    #[error("User data unavailable: {0}")]
    DataUnavailable(#[from] StoreError),
}

/// Stateless orchestration over a remote source, a local store, and a
/// connectivity oracle. Clone is cheap and clones share collaborators.
#[derive(Clone)]
pub struct SyncRepository {
    source: Arc<dyn UserSource>,
    store: Arc<dyn UserStore>,
    connectivity: Arc<dyn Connectivity>,
    lookup_window: u32,
}

impl SyncRepository {
    pub fn new(
        source: Arc<dyn UserSource>,
        store: Arc<dyn UserStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            source,
            store,
            connectivity,
            lookup_window: DEFAULT_LOOKUP_WINDOW,
        }
    }

    pub fn with_lookup_window(mut self, lookup_window: u32) -> Self {
        self.lookup_window = lookup_window;
        self
    }

    pub fn lookup_window(&self) -> u32 {
        self.lookup_window
    }

    /// Ask the oracle on the blocking pool; a probe may resolve and connect.
    async fn is_online(&self) -> bool {
        let connectivity = Arc::clone(&self.connectivity);
        match tokio::task::spawn_blocking(move || connectivity.is_online()).await {
            Ok(online) => online,
            Err(e) => {
                warn!(error = %e, "Connectivity check failed, assuming offline");
                false
            }
        }
    }

    /// Fetch one page of users, from the network when possible.
    ///
    /// Fails only when the cache path is taken and the store itself errors.
    pub async fn get_page(&self, limit: u32, skip: u32) -> Result<UserPage, SyncError> {
        if self.is_online().await {
            match self.source.fetch_users(limit, skip).await {
                Ok(page) => {
                    info!(limit, skip, returned = page.users.len(), "Serving page from network");
                    if let Err(e) = self.store.upsert_many(&page.users).await {
                        warn!(error = %e, "Failed to cache fetched users");
                    }
                    return Ok(page);
                }
                Err(e) => {
                    warn!(
                        limit,
                        skip,
                        network = e.is_network(),
                        error = %e,
                        "Fetch failed, falling back to cache"
                    );
                }
            }
        } else {
            debug!(limit, skip, "Offline, reading page from cache");
        }

        self.cached_page(limit, skip).await
    }

    async fn cached_page(&self, limit: u32, skip: u32) -> Result<UserPage, SyncError> {
        let total = self.store.count().await?;
        let users = self.store.get_page(limit, skip).await?;
        info!(limit, skip, returned = users.len(), total, "Serving page from cache");
        Ok(UserPage {
            users,
            total,
            skip,
            limit,
        })
    }

    /// Look up a single user, from the network lookup window when possible.
    pub async fn get_user_by_id(&self, id: i64) -> Result<User, SyncError> {
        if self.is_online().await {
            match self.source.fetch_users(self.lookup_window, 0).await {
                Ok(page) => match page.users.into_iter().find(|u| u.id == id) {
                    Some(user) => {
                        if let Err(e) = self.store.upsert(&user).await {
                            warn!(id, error = %e, "Failed to cache fetched user");
                        }
                        return Ok(user);
                    }
                    None => {
                        debug!(id, window = self.lookup_window, "User not in lookup window, checking cache");
                    }
                },
                Err(e) => {
                    warn!(id, error = %e, "User lookup failed, falling back to cache");
                }
            }
        }

        match self.store.get_by_id(id).await? {
            Some(user) => Ok(user),
            None => Err(SyncError::NotFound(id)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
