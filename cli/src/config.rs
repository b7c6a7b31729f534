// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf, str::FromStr, time::Duration};

use tokio::fs;

use questsync_core::{APP_NAME, Config as CoreConfig, ConfigDuration, get_config_dir};
use questsync_remote::RemoteConfig;

const CONFIG_ENV: &str = "QUESTSYNC_CONFIG";
const DEV_ENV: &str = "QUESTSYNC_DEV";

const DEV_VALID_TRUE: &[&str] = &["1", "true", "yes"];
const DEV_VALID_FALSE: &[&str] = &["0", "false", "no"];

/// Locates and reads the configuration file.
///
/// The path is taken from `--config`, then `QUESTSYNC_CONFIG`, then
/// `$XDG_CONFIG_HOME/questsync/config.toml`.
#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<(CoreConfig, Config), Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        PathBuf::from(env_path)
    } else {
        if let Some(true) = is_dev_mode() {
            return Err(format!(
                "Development environment detected ({DEV_ENV} is set): config must be explicitly specified via --config or {CONFIG_ENV} environment variable",
            ).into());
        }
        let config = get_config_dir()?.join(format!("{APP_NAME}/config.toml"));
        if !config.exists() {
            return Err(format!("No config found at: {}", config.display()).into());
        }
        config
    };

    fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?
        .parse::<ConfigRaw>()
        .map(|a| {
            let config = Config {
                remote: a.remote,
                watch: a.watch,
            };
            (a.core, config)
        })
}

/// Settings used only by the command-line interface.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection to the remote progress store.
    pub remote: RemoteConfig,

    /// Behaviour of `questsync watch`.
    pub watch: WatchConfig,
}

/// Settings of the long-running watch mode.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct WatchConfig {
    /// How often the remote store is probed to detect connectivity changes.
    #[serde(default = "default_probe_interval")]
    pub probe_interval: ConfigDuration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            probe_interval: default_probe_interval(),
        }
    }
}

fn default_probe_interval() -> ConfigDuration {
    ConfigDuration(Duration::from_secs(30))
}

#[derive(Debug, serde::Deserialize)]
struct ConfigRaw {
    core: CoreConfig,
    remote: RemoteConfig,
    #[serde(default)]
    watch: WatchConfig,
}

impl FromStr for ConfigRaw {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

fn is_dev_mode() -> Option<bool> {
    let val = std::env::var(DEV_ENV).ok()?;
    let lower = val.to_lowercase();
    if DEV_VALID_TRUE.contains(&lower.as_str()) {
        Some(true)
    } else if DEV_VALID_FALSE.contains(&lower.as_str()) {
        Some(false)
    } else {
        tracing::warn!(
            "Unrecognized value for {}: '{}'. Expected one of: true: {}, false: {}. Treating as unset.",
            DEV_ENV,
            val,
            DEV_VALID_TRUE.join(", "),
            DEV_VALID_FALSE.join(", "),
        );
        None
    }
}
