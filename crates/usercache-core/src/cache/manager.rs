use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::models::User;

use super::{StoreError, UserStore};

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

/// File holding the cached user table
const USERS_FILE: &str = "users.json";

/// Extension given to an unreadable cache file when it is set aside
const CORRUPT_EXTENSION: &str = "corrupt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

struct CacheTable {
    users: BTreeMap<i64, User>,
    written_at: Option<DateTime<Utc>>,
}

/// Local user cache keyed by id.
///
/// Every mutation builds the next table off to the side, persists it, and
/// only then swaps it in, so readers see either the old or the new record.
/// Writers are serialized by `writer`; the table lock is held only for the
/// swap, never across file I/O.
pub struct UserCache {
    path: Option<PathBuf>,
    table: RwLock<CacheTable>,
    writer: tokio::sync::Mutex<()>,
}

impl UserCache {
    /// Open (or create) the cache stored under `cache_dir`.
    ///
    /// An unparseable cache file is renamed to `users.corrupt` and the cache
    /// starts empty. I/O errors are still returned.
    pub fn open(cache_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(cache_dir)?;
        let path = cache_dir.join(USERS_FILE);

        let cached = match Self::read_file(&path) {
            Ok(cached) => cached,
            Err(StoreError::Json(e)) => {
                let aside = path.with_extension(CORRUPT_EXTENSION);
                warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "Cache file is corrupt, starting empty"
                );
                fs::rename(&path, &aside)?;
                None
            }
            Err(e) => return Err(e),
        };

        let table = match cached {
            Some(cached) => CacheTable {
                users: cached.data.into_iter().map(|u| (u.id, u)).collect(),
                written_at: Some(cached.cached_at),
            },
            None => CacheTable {
                users: BTreeMap::new(),
                written_at: None,
            },
        };
        debug!(path = %path.display(), count = table.users.len(), "User cache opened");

        Ok(Self::with_table(Some(path), table))
    }

    /// A cache that lives only as long as this value
    pub fn in_memory() -> Self {
        Self::with_table(
            None,
            CacheTable {
                users: BTreeMap::new(),
                written_at: None,
            },
        )
    }

    fn with_table(path: Option<PathBuf>, table: CacheTable) -> Self {
        Self {
            path,
            table: RwLock::new(table),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read_file(path: &Path) -> Result<Option<CachedData<Vec<User>>>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Write the table atomically via a temp file
    async fn write_file(path: &Path, json: &[u8]) -> Result<(), StoreError> {
        let temp_path = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(json).await?;
        file.sync_all().await?;
        tokio::fs::rename(&temp_path, path).await?;
        Ok(())
    }

    /// Persist `next` and swap it in. Callers hold `writer`.
    async fn commit(&self, next: BTreeMap<i64, User>) -> Result<(), StoreError> {
        let cached = CachedData::new(next.values().collect::<Vec<_>>());
        if let Some(ref path) = self.path {
            let json = serde_json::to_vec_pretty(&cached)?;
            Self::write_file(path, &json).await?;
        }
        let written_at = cached.cached_at;
        drop(cached);

        let mut table = self.table.write();
        table.users = next;
        table.written_at = Some(written_at);
        Ok(())
    }

    async fn write_all(&self, users: &[User]) -> Result<(), StoreError> {
        if users.is_empty() {
            return Ok(());
        }
        let _writer = self.writer.lock().await;
        let mut next = self.table.read().users.clone();
        for user in users {
            next.insert(user.id, user.clone());
        }
        self.commit(next).await
    }

    /// Time of the last write, formatted for display ("5m ago")
    pub fn age_display(&self) -> Option<String> {
        self.table
            .read()
            .written_at
            .map(|at| CachedData { data: (), cached_at: at }.age_display())
    }

    /// True when the cache has never been written or is over an hour old
    pub fn is_stale(&self) -> bool {
        match self.table.read().written_at {
            Some(at) => CachedData { data: (), cached_at: at }.is_stale(),
            None => true,
        }
    }
}

#[async_trait]
impl UserStore for UserCache {
    async fn upsert(&self, user: &User) -> Result<(), StoreError> {
        self.write_all(std::slice::from_ref(user)).await
    }

    async fn upsert_many(&self, users: &[User]) -> Result<(), StoreError> {
        self.write_all(users).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().users.get(&id).cloned())
    }

    async fn get_page(&self, limit: u32, skip: u32) -> Result<Vec<User>, StoreError> {
        Ok(self
            .table
            .read()
            .users
            .values()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u32, StoreError> {
        let len = self.table.read().users.len();
        Ok(u32::try_from(len).unwrap_or(u32::MAX))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        self.commit(BTreeMap::new()).await
    }
}

// ============================================================================
// Tests
// ============================================================================
