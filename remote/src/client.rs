// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Client for the remote progress table.

use std::sync::Arc;

use jiff::civil::Date;
use reqwest::Method;

use crate::config::RemoteConfig;
use crate::error::RemoteApiError;
use crate::http::HttpClient;
use crate::types::ProgressRow;

/// Client for reading and writing completed days on the remote store.
///
/// # Example
///
/// ```ignore
/// use questsync_remote::{AuthMethod, ProgressClient, ProgressRow, RemoteConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RemoteConfig {
///     base_url: "https://project.example.co".to_string(),
///     api_key: Some("anon-key".to_string()),
///     auth: AuthMethod::Bearer { token: "user-jwt".to_string() },
///     ..Default::default()
/// };
///
/// let client = ProgressClient::new(config)?;
/// let rows = client.list("user-1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProgressClient {
    http: Arc<HttpClient>,
    config: RemoteConfig,
}

impl ProgressClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or HTTP client initialization fails.
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteApiError> {
        if config.base_url.trim().is_empty() {
            return Err(RemoteApiError::Config("base_url must not be empty".into()));
        }

        let http = HttpClient::new(config.clone())?;
        Ok(Self {
            http: Arc::new(http),
            config,
        })
    }

    /// Inserts a completed day. A row that already exists is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(self), fields(user_id = %row.user_id, read_date = %row.read_date))]
    pub async fn insert(&self, row: &ProgressRow) -> Result<(), RemoteApiError> {
        let req = self
            .http
            .build_request(Method::POST, &self.table_url())
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(&[row]);

        self.http.execute(req).await?;
        Ok(())
    }

    /// Inserts a completed day, replacing `completed_at` if the row exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(self), fields(user_id = %row.user_id, read_date = %row.read_date))]
    pub async fn upsert(&self, row: &ProgressRow) -> Result<(), RemoteApiError> {
        let req = self
            .http
            .build_request(Method::POST, &self.table_url())
            .query(&[("on_conflict", "user_id,read_date")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);

        self.http.execute(req).await?;
        Ok(())
    }

    /// Deletes the row for a day. Deleting a missing row succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, read_date: Date) -> Result<(), RemoteApiError> {
        let req = self
            .http
            .build_request(Method::DELETE, &self.table_url())
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("read_date", format!("eq.{read_date}")),
            ])
            .header("Prefer", "return=minimal");

        self.http.execute(req).await?;
        Ok(())
    }

    /// Lists every completed day of a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response can't be decoded.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user_id: &str) -> Result<Vec<ProgressRow>, RemoteApiError> {
        let req = self
            .http
            .build_request(Method::GET, &self.table_url())
            .query(&[
                ("select", "user_id,read_date,completed_at".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "read_date.asc".to_string()),
            ]);

        let resp = self.http.execute(req).await?;
        let body = resp.text().await?;
        let rows = serde_json::from_str(&body)?;
        Ok(rows)
    }

    /// Checks that the remote store answers, without reading any row.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or rejects the request.
    #[tracing::instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), RemoteApiError> {
        let req = self
            .http
            .build_request(Method::HEAD, &self.table_url())
            .query(&[("limit", "0")]);

        self.http.execute(req).await?;
        Ok(())
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }
}
