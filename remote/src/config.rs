// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// Authentication method for the remote store.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(tag = "type")]
pub enum AuthMethod {
    /// Anonymous access, only the project API key is sent.
    #[serde(rename = "none")]
    #[default]
    None,
    /// Bearer token of the signed-in user.
    #[serde(rename = "bearer")]
    Bearer {
        /// Access token.
        token: String,
    },
}

/// Remote progress store configuration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the backend, e.g. `https://project.example.co`.
    pub base_url: String,
    /// Name of the progress table.
    #[serde(default = "default_table")]
    pub table: String,
    /// Project API key, sent as the `apikey` header.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Authentication method.
    #[serde(default)]
    pub auth: AuthMethod,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_table() -> String {
    "progress".to_string()
}

const fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("questsync-remote/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            table: default_table(),
            api_key: None,
            auth: AuthMethod::default(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
