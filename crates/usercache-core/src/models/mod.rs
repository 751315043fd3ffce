//! Data models for the user directory.
//!
//! - `User`: a single directory entry, shared by the API and the cache
//! - `UserPage`: one page of users plus total/skip/limit metadata

pub mod user;

pub use user::{User, UserPage, DEFAULT_AVATAR_URL};
