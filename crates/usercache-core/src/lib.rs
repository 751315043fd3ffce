//! Offline-capable user directory client.
//!
//! Reads go through [`SyncRepository`], which prefers the remote API, writes
//! everything it fetches into the local cache, and falls back to that cache
//! when the network is unavailable or failing. [`UserListController`] builds
//! a paginated, ever-growing list on top of it for display.

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod controller;
pub mod models;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, UserSource};
pub use cache::{StoreError, UserCache, UserStore};
pub use config::Config;
pub use connectivity::{Connectivity, ManualConnectivity, TcpProbe};
pub use controller::{ListState, Selection, UserListController};
pub use models::{User, UserPage};
pub use repository::{SyncError, SyncRepository};
