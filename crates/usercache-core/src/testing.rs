//! Fakes shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::api::{ApiError, UserSource};
use crate::cache::{StoreError, UserCache, UserStore};
use crate::models::{User, UserPage};

pub(crate) fn user(id: i64) -> User {
    User {
        id,
        first_name: format!("First{}", id),
        last_name: format!("Last{}", id),
        maiden_name: None,
        age: Some(30),
        gender: Some("female".to_string()),
        email: format!("user{}@example.com", id),
        phone: "+1 555-0100".to_string(),
        username: format!("user{}", id),
        image: None,
        birth_date: None,
        height: None,
        weight: None,
        university: None,
    }
}

pub(crate) fn users(ids: impl IntoIterator<Item = i64>) -> Vec<User> {
    ids.into_iter().map(user).collect()
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum FailMode {
    Network,
    Server,
}

/// A real transport-level reqwest error, built without touching the network
fn network_error() -> ApiError {
    reqwest::Client::new()
        .get("not a url")
        .build()
        .unwrap_err()
        .into()
}

/// In-memory remote directory that slices `users` like the real API.
pub(crate) struct FakeSource {
    users: Mutex<Vec<User>>,
    failure: Mutex<Option<FailMode>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<(u32, u32)>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeSource {
    pub(crate) fn new(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            gate: None,
        }
    }

    /// Every fetch waits for one permit on `gate` before answering
    pub(crate) fn gated(users: Vec<User>, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(users)
        }
    }

    pub(crate) fn fail_with(&self, mode: FailMode) {
        *self.failure.lock() = Some(mode);
    }

    pub(crate) fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub(crate) fn set_users(&self, users: Vec<User>) {
        *self.users.lock() = users;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<(u32, u32)> {
        *self.last_request.lock()
    }
}

#[async_trait]
impl UserSource for FakeSource {
    async fn fetch_users(&self, limit: u32, skip: u32) -> Result<UserPage, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some((limit, skip));

        if let Some(ref gate) = self.gate {
            gate.acquire()
                .await
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?
                .forget();
        }

        let failure = *self.failure.lock();
        match failure {
            Some(FailMode::Network) => return Err(network_error()),
            Some(FailMode::Server) => {
                return Err(ApiError::ServerError("internal error".to_string()))
            }
            None => {}
        }

        let users = self.users.lock();
        let page = users
            .iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(UserPage {
            users: page,
            total: users.len() as u32,
            skip,
            limit,
        })
    }
}

/// A working in-memory store that can be switched into failing every call.
pub(crate) struct FlakyStore {
    inner: UserCache,
    broken: AtomicBool,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: UserCache::in_memory(),
            broken: AtomicBool::new(false),
        }
    }

    pub(crate) fn broken() -> Self {
        let store = Self::new();
        store.set_broken(true);
        store
    }

    pub(crate) fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk unavailable",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for FlakyStore {
    async fn upsert(&self, user: &User) -> Result<(), StoreError> {
        self.check()?;
        self.inner.upsert(user).await
    }

    async fn upsert_many(&self, users: &[User]) -> Result<(), StoreError> {
        self.check()?;
        self.inner.upsert_many(users).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.check()?;
        self.inner.get_by_id(id).await
    }

    async fn get_page(&self, limit: u32, skip: u32) -> Result<Vec<User>, StoreError> {
        self.check()?;
        self.inner.get_page(limit, skip).await
    }

    async fn count(&self) -> Result<u32, StoreError> {
        self.check()?;
        self.inner.count().await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.clear().await
    }
}
