//! API client for the remote user directory.
//!
//! This module provides the `ApiClient` struct, the HTTP implementation of
//! `UserSource`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use crate::models::UserPage;

use super::{ApiError, UserSource};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL of the directory API
pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the user directory.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client against the default directory
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a specific base URL (trailing slash optional)
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

/// Parse a `/users` response body into a page
pub(crate) fn parse_users_response(text: &str) -> Result<UserPage, ApiError> {
    serde_json::from_str(text)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse users response: {}", e)))
}

#[async_trait]
impl UserSource for ApiClient {
    async fn fetch_users(&self, limit: u32, skip: u32) -> Result<UserPage, ApiError> {
        let url = self.users_url();

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&[("limit", limit), ("skip", skip)])
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        let page = parse_users_response(&text)?;
        debug!(
            limit,
            skip,
            returned = page.users.len(),
            total = page.total,
            "Users page received"
        );
        Ok(page)
    }
}

// ============================================================================
// Tests
// ============================================================================
