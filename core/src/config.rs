// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de;

use crate::sync::{Backoff, SyncOptions};

/// The name of the application.
pub const APP_NAME: &str = "questsync";

/// Configuration of the sync core.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Owner of the reading plan whose progress is synced.
    pub user_id: String,

    /// Directory for storing application state.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Upper bound of a single remote call.
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout: ConfigDuration,

    /// How long connectivity must hold before a reconnect sweep starts.
    #[serde(default = "default_debounce")]
    pub debounce: ConfigDuration,

    /// First retry delay of a failing change.
    #[serde(default = "default_backoff_base")]
    pub backoff_base: ConfigDuration,

    /// Longest retry delay of a failing change.
    #[serde(default = "default_backoff_max")]
    pub backoff_max: ConfigDuration,

    /// Period of background sweeps while watching, "0s" disables them.
    #[serde(default = "default_background_period")]
    pub background_period: ConfigDuration,

    /// Age in days after which synced changes and cached content are removed.
    #[serde(default = "default_cleanup_days")]
    pub cleanup_days: u32,
}

impl Config {
    /// Creates a configuration with default settings for `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            state_dir: None,
            remote_timeout: default_remote_timeout(),
            debounce: default_debounce(),
            backoff_base: default_backoff_base(),
            backoff_max: default_backoff_max(),
            background_period: default_background_period(),
            cleanup_days: default_cleanup_days(),
        }
    }

    /// Normalize the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the user id is empty or a path can't be expanded.
    pub fn normalize(&mut self) -> Result<(), Box<dyn Error>> {
        if self.user_id.trim().is_empty() {
            return Err("user_id must not be empty".into());
        }

        // Normalize state directory
        match &self.state_dir {
            Some(a) => {
                self.state_dir = Some(
                    expand_path(a)
                        .map_err(|e| format!("Failed to expand state directory path: {e}"))?,
                );
            }

            None => match get_state_dir() {
                Ok(a) => self.state_dir = Some(a.join(APP_NAME)),
                Err(e) => tracing::warn!(err = %e, "failed to get state directory"),
            },
        }

        if self.backoff_max.0 < self.backoff_base.0 {
            tracing::warn!("backoff_max is below backoff_base, using backoff_base for both");
            self.backoff_max = self.backoff_base;
        }

        Ok(())
    }

    /// Path of the local store, if a state directory is known.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.state_dir.as_ref().map(|a| a.join(format!("{APP_NAME}.db")))
    }

    /// Periodic background sweep interval, `None` if disabled.
    pub fn background_period(&self) -> Option<Duration> {
        Some(self.background_period.0).filter(|d| !d.is_zero())
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            remote_timeout: self.remote_timeout.0,
            debounce: self.debounce.0,
            backoff: Backoff {
                base: self.backoff_base.0,
                max: self.backoff_max.0,
            },
        }
    }
}

fn default_remote_timeout() -> ConfigDuration {
    ConfigDuration(Duration::from_secs(8))
}

fn default_debounce() -> ConfigDuration {
    ConfigDuration(Duration::from_millis(1500))
}

fn default_backoff_base() -> ConfigDuration {
    ConfigDuration(Duration::from_secs(5))
}

fn default_backoff_max() -> ConfigDuration {
    ConfigDuration(Duration::from_secs(10 * 60))
}

fn default_background_period() -> ConfigDuration {
    ConfigDuration(Duration::from_secs(15 * 60))
}

const fn default_cleanup_days() -> u32 {
    30
}

/// A duration written like "HH:MM", "1d", "24h", "60m", "90s" or "1500ms".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDuration(pub Duration);

impl<'de> serde::Deserialize<'de> for ConfigDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DurationVisitor;

        impl de::Visitor<'_> for DurationVisitor {
            type Value = ConfigDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    r#"a duration string like "HH:MM", "1d", "24h", "60m", "1800s" or "1500ms""#,
                )
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                parse_duration(value)
                    .map(ConfigDuration)
                    .map_err(|e| de::Error::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(DurationVisitor)
    }
}

/// Handle tilde (~) and environment variables in the path
pub fn expand_path(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path.to_str().ok_or("Invalid path")?;

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle config directories
    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, Box<dyn Error>> {
    dirs::home_dir().ok_or("User-specific home directory not found".into())
}

/// The user-specific configuration directory.
pub fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(windows)]
    let config_dir = dirs::config_dir();
    config_dir.ok_or("User-specific config directory not found".into())
}

fn get_state_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(windows)]
    let state_dir = dirs::data_dir();
    state_dir.ok_or("User-specific state directory not found".into())
}

/// Parse a duration string in the format "HH:MM" / "1d" / "24h" / "60m" / "1800s" / "1500ms".
fn parse_duration(s: &str) -> Result<Duration, Box<dyn Error>> {
    // Try to parse "HH:MM" format
    if let Some((h, m)) = s.split_once(':') {
        let hours: u64 = h.trim().parse()?;
        let minutes: u64 = m.trim().parse()?;
        let minutes = hours
            .checked_mul(60)
            .and_then(|a| a.checked_add(minutes))
            .ok_or_else(|| too_long(s))?;
        secs(s, minutes, 60)
    }
    // Match suffix-based formats, "ms" before "m" and "s"
    else if let Some(rest) = s.strip_suffix("ms") {
        let millis: u64 = rest.trim().parse()?;
        Ok(Duration::from_millis(millis))
    } else if let Some(rest) = s.strip_suffix("d") {
        secs(s, rest.trim().parse()?, 24 * 60 * 60)
    } else if let Some(rest) = s.strip_suffix("h") {
        secs(s, rest.trim().parse()?, 60 * 60)
    } else if let Some(rest) = s.strip_suffix("m") {
        secs(s, rest.trim().parse()?, 60)
    } else if let Some(rest) = s.strip_suffix("s") {
        let seconds: u64 = rest.trim().parse()?;
        Ok(Duration::from_secs(seconds))
    } else {
        Err(format!("Invalid duration format: {s}").into())
    }
}

fn secs(s: &str, count: u64, unit: u64) -> Result<Duration, Box<dyn Error>> {
    let secs = count.checked_mul(unit).ok_or_else(|| too_long(s))?;
    Ok(Duration::from_secs(secs))
}

fn too_long(s: &str) -> Box<dyn Error> {
    format!("Duration too long: {s}").into()
}
