// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Remote store client errors.
#[non_exhaustive]
#[derive(Debug)]
pub enum RemoteApiError {
    /// Transport failure or unexpected HTTP status.
    Http(String),

    /// The server rejected the credentials.
    Auth(String),

    /// The server rejected the request payload.
    Validation(String),

    /// Configuration error.
    Config(String),

    /// Invalid response from server.
    InvalidResponse(String),
}

impl fmt::Display for RemoteApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::Auth(e) => write!(f, "Authentication failed: {e}"),
            Self::Validation(e) => write!(f, "Request rejected: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::InvalidResponse(e) => write!(f, "Invalid server response: {e}"),
        }
    }
}

impl std::error::Error for RemoteApiError {}

impl From<reqwest::Error> for RemoteApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<serde_json::Error> for RemoteApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}
