// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg};
use questsync_core::Quest;

#[derive(Debug, Clone)]
pub struct CmdSettingGet {
    pub key: String,
}

impl CmdSettingGet {
    pub const NAME: &str = "get";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Print a stored setting as JSON")
            .arg(arg!(key: <KEY> "Name of the setting"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        match matches.get_one::<String>("key") {
            Some(key) => Self { key: key.clone() },
            _ => unreachable!(),
        }
    }

    pub async fn run(self, quest: &Quest) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "reading setting...");
        match quest.setting(&self.key).await? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => return Err(format!("Setting `{}` is not set", self.key).into()),
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdSettingSet {
    pub key: String,
    pub value: serde_json::Value,
}

impl CmdSettingSet {
    pub const NAME: &str = "set";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Store a setting; the value is read as JSON, or as a string if it isn't JSON")
            .arg(arg!(key: <KEY> "Name of the setting"))
            .arg(arg!(value: <VALUE> "Value of the setting"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        match (
            matches.get_one::<String>("key"),
            matches.get_one::<String>("value"),
        ) {
            (Some(key), Some(value)) => Self {
                key: key.clone(),
                value: parse_value(value),
            },
            _ => unreachable!(),
        }
    }

    pub async fn run(self, quest: &Quest) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "storing setting...");
        quest.set_setting(&self.key, &self.value).await?;
        println!("{} = {}", self.key, self.value);
        Ok(())
    }
}

fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
