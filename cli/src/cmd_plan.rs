// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::BTreeMap, error::Error, path::PathBuf};

use clap::{ArgMatches, Command, ValueHint, arg, value_parser};
use colored::Colorize;
use jiff::civil::Date;
use questsync_core::Quest;
use tokio::fs;

use crate::util::{ArgOutputFormat, arg_date, get_date};

#[derive(Debug, Clone, Copy)]
pub struct CmdPlanShow {
    pub date: Date,
    pub output_format: ArgOutputFormat,
}

impl CmdPlanShow {
    pub const NAME: &str = "show";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show the readings of a day from the cached plan")
            .arg(arg_date())
            .arg(ArgOutputFormat::arg())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            date: get_date(matches),
            output_format: ArgOutputFormat::from(matches),
        }
    }

    pub async fn run(self, quest: &Quest) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "showing reading plan...");
        let plan = quest
            .plan()
            .await?
            .ok_or("No reading plan cached, import one with `questsync plan import`")?;
        let readings = plan.readings_on(self.date);

        match self.output_format {
            ArgOutputFormat::Json => {
                let value = serde_json::json!({
                    "date": self.date.to_string(),
                    "readings": readings,
                    "last_updated": plan.last_updated.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            ArgOutputFormat::Table if readings.is_empty() => {
                println!("{} rest day", self.date.to_string().bold());
            }
            ArgOutputFormat::Table => {
                println!("{}", self.date.to_string().bold());
                for reading in readings {
                    println!("  {} {reading}", "►".green());
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdPlanImport {
    pub path: PathBuf,
}

impl CmdPlanImport {
    pub const NAME: &str = "import";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Replace the cached plan with a JSON file mapping days to readings")
            .arg(
                arg!(path: <FILE> "Path to the plan, e.g. {\"2025-03-01\": [\"Genesis 1-3\"]}")
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
    }

    pub fn from(matches: &ArgMatches) -> Self {
        match matches.get_one::<PathBuf>("path") {
            Some(path) => Self { path: path.clone() },
            _ => unreachable!(),
        }
    }

    pub async fn run(self, quest: &Quest) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "importing reading plan...");
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| format!("Failed to read plan at {}: {e}", self.path.display()))?;
        let readings = parse_plan(&content)?;

        let plan = quest.save_plan(readings).await?;
        println!(
            "{} {} reading days cached",
            "Imported:".green(),
            plan.readings.len()
        );
        Ok(())
    }
}

fn parse_plan(content: &str) -> Result<BTreeMap<Date, Vec<String>>, Box<dyn Error>> {
    let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(content)?;
    raw.into_iter()
        .map(|(day, readings)| {
            let day = day
                .parse::<Date>()
                .map_err(|e| format!("Invalid day `{day}` in plan: {e}"))?;
            Ok((day, readings))
        })
        .collect()
}
