// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg, value_parser};
use colored::Colorize;
use questsync_core::Quest;

#[derive(Debug, Clone, Copy)]
pub struct CmdCleanup {
    pub days: Option<u32>,
}

impl CmdCleanup {
    pub const NAME: &str = "cleanup";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Remove synced changes and cached chapters older than some days")
            .arg(
                arg!(--days <DAYS> "Age in days, defaults to `cleanup_days` of the config")
                    .value_parser(value_parser!(u32)),
            )
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            days: matches.get_one::<u32>("days").copied(),
        }
    }

    pub async fn run(self, quest: &Quest) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "cleaning up local store...");
        let report = quest.cleanup(self.days).await?;
        println!(
            "{} {} synced changes and {} cached chapters removed",
            "Cleaned:".green(),
            report.synced_progress,
            report.contents,
        );
        Ok(())
    }
}
