// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use clap::{Arg, ArgMatches, ValueEnum, arg, value_parser};
use jiff::{Zoned, civil::Date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArgOutputFormat {
    Json,
    Table,
}

impl ArgOutputFormat {
    pub fn arg() -> Arg {
        arg!(--"output-format" <FORMAT> "Output format")
            .value_parser(value_parser!(ArgOutputFormat))
            .default_value("table")
    }

    pub fn from(matches: &ArgMatches) -> Self {
        matches
            .get_one("output-format")
            .copied()
            .unwrap_or(ArgOutputFormat::Table)
    }
}

pub fn arg_date() -> Arg {
    arg!([DATE] "The reading day: YYYY-MM-DD, today, yesterday or tomorrow")
        .value_parser(parse_date)
}

/// The date argument, today if absent.
pub fn get_date(matches: &ArgMatches) -> Date {
    matches
        .get_one::<Date>("DATE")
        .copied()
        .unwrap_or_else(today)
}

pub fn today() -> Date {
    Zoned::now().date()
}

pub fn parse_date(s: &str) -> Result<Date, String> {
    let today = today();
    match s.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => today.yesterday().map_err(|e| format!("Invalid date: {e}")),
        "tomorrow" => today.tomorrow().map_err(|e| format!("Invalid date: {e}")),
        other => other.parse().map_err(|_| {
            "Invalid date format. Expected YYYY-MM-DD, today, yesterday or tomorrow".to_string()
        }),
    }
}
