// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Colorize;
use jiff::civil::Date;
use questsync_core::{Delivery, Quest};

use crate::util::{arg_date, get_date};

#[derive(Debug, Clone, Copy)]
pub struct CmdRecord {
    pub date: Date,
}

impl CmdRecord {
    pub const NAME: &str = "record";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("done")
            .about("Mark a reading day as read")
            .arg(arg_date())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            date: get_date(matches),
        }
    }

    pub async fn run(self, quest: &Quest) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "recording progress...");
        let delivery = quest.record(self.date).await?;
        print_delivery(quest, self.date, "marked as read", delivery).await;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CmdRemove {
    pub date: Date,
}

impl CmdRemove {
    pub const NAME: &str = "remove";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("undo")
            .about("Clear the read mark of a reading day")
            .arg(arg_date())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            date: get_date(matches),
        }
    }

    pub async fn run(self, quest: &Quest) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "removing progress...");
        let delivery = quest.remove(self.date).await?;
        print_delivery(quest, self.date, "marked as unread", delivery).await;
        Ok(())
    }
}

async fn print_delivery(quest: &Quest, date: Date, what: &str, delivery: Delivery) {
    match delivery {
        Delivery::Remote => println!("{} {date} {what}", "Synced:".green()),
        Delivery::Queued => {
            let pending = quest.pending_count().await;
            println!(
                "{} {date} {what}, will sync when online ({pending} pending)",
                "Queued:".yellow(),
            );
        }
    }
}
