// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Colorize;
use questsync_core::{ProgressEvent, Quest, SweepOutcome, SyncError};
use tokio::sync::watch;

use crate::cli::Context;
use crate::util::{ArgOutputFormat, today};

#[derive(Debug, Clone, Copy)]
pub struct CmdPending {
    pub output_format: ArgOutputFormat,
}

impl CmdPending {
    pub const NAME: &str = "pending";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List changes waiting for the remote store")
            .arg(ArgOutputFormat::arg())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: ArgOutputFormat::from(matches),
        }
    }

    pub async fn run(self, quest: &Quest) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing pending changes...");
        let events = quest.pending_events().await?;
        match self.output_format {
            ArgOutputFormat::Json => {
                let rows: Vec<_> = events.iter().map(event_json).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            ArgOutputFormat::Table if events.is_empty() => println!("Nothing to sync"),
            ArgOutputFormat::Table => {
                println!(
                    "{:>6}  {:<10}  {:<10}  {:<20}  {:>8}  {}",
                    "ID", "DATE", "OPERATION", "RECORDED", "ATTEMPTS", "LAST ERROR"
                );
                for event in &events {
                    println!(
                        "{:>6}  {:<10}  {:<10}  {:<20}  {:>8}  {}",
                        event.id,
                        event.read_date.to_string(),
                        event.operation.as_str(),
                        event.recorded_at.strftime("%Y-%m-%d %H:%M:%S").to_string(),
                        event.attempts,
                        event.last_error.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
        Ok(())
    }
}

fn event_json(event: &ProgressEvent) -> serde_json::Value {
    serde_json::json!({
        "id": event.id,
        "user_id": event.user_id,
        "read_date": event.read_date.to_string(),
        "operation": event.operation.as_str(),
        "recorded_at": event.recorded_at.to_string(),
        "attempts": event.attempts,
        "last_error": event.last_error,
        "next_attempt_at": event.next_attempt_at.map(|a| a.to_string()),
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CmdSync;

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME).about("Push every pending change now, ignoring retry delays")
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        Self
    }

    pub async fn run(self, quest: &Quest) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "forcing sync...");
        match quest.force_sync().await {
            Ok(SweepOutcome::Completed(report)) => {
                println!(
                    "{} {} synced, {} failed, {} deferred",
                    "Done:".green(),
                    report.synced,
                    report.failed,
                    report.deferred,
                );
                if report.interrupted {
                    println!("{} connection lost during sync", "Warning:".yellow());
                }
            }
            Ok(SweepOutcome::Busy) => println!("A sync is already running"),
            Ok(SweepOutcome::Offline) | Err(SyncError::Offline) => {
                println!("{} remote store unreachable, nothing synced", "Offline:".yellow());
            }
            Ok(SweepOutcome::NoStore) => return Err("Local store unavailable".into()),
            Err(e) => return Err(e.into()),
        }

        let pending = quest.pending_count().await;
        if pending > 0 {
            println!("{pending} changes still pending");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CmdStatus {
    pub output_format: ArgOutputFormat,
}

impl CmdStatus {
    pub const NAME: &str = "status";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show connectivity, pending changes and today's reading")
            .arg(ArgOutputFormat::arg())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: ArgOutputFormat::from(matches),
        }
    }

    pub async fn run(self, quest: &Quest, ctx: &Context) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "showing status...");
        let online = quest.is_online();
        let remote_days = if online {
            match ctx.client.list(&quest.config().user_id).await {
                Ok(rows) => Some(rows.len()),
                Err(e) => {
                    tracing::warn!(err = %e, "failed to list remote progress");
                    None
                }
            }
        } else {
            None
        };
        let pending = quest.pending_count().await;
        let today = today();
        let readings = match quest.plan().await {
            Ok(plan) => plan.map(|p| p.readings_on(today).to_vec()),
            Err(e) => {
                tracing::warn!(err = %e, "reading plan unavailable");
                None
            }
        };

        match self.output_format {
            ArgOutputFormat::Json => {
                let status = serde_json::json!({
                    "user_id": quest.config().user_id,
                    "online": online,
                    "pending": pending,
                    "remote_days": remote_days,
                    "today": today.to_string(),
                    "readings": readings,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            ArgOutputFormat::Table => {
                let connectivity = if online {
                    "online".green()
                } else {
                    "offline".yellow()
                };
                println!("User:     {}", quest.config().user_id);
                println!("Remote:   {connectivity}");
                println!("Pending:  {pending}");
                println!("Synced:   {}", remote_days_label(remote_days));
                match readings {
                    Some(readings) if readings.is_empty() => println!("Today:    rest day"),
                    Some(readings) => println!("Today:    {}", readings.join("; ")),
                    None => println!("Today:    no reading plan cached"),
                }
            }
        }
        Ok(())
    }
}

fn remote_days_label(days: Option<usize>) -> String {
    match days {
        Some(1) => "1 day on remote".to_string(),
        Some(n) => format!("{n} days on remote"),
        None => "unknown".to_string(),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CmdWatch;

impl CmdWatch {
    pub const NAME: &str = "watch";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Stay running and sync whenever the remote store becomes reachable")
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        Self
    }

    pub async fn run(self, quest: &mut Quest, ctx: &Context) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "watching connectivity...");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let interval = ctx.config.watch.probe_interval.0;
        let probe = ctx.probe.clone().spawn(
            quest.manager().reachability().clone(),
            interval,
            shutdown_rx.clone(),
        );
        let ctrl_c = tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(err = %e, "failed to listen for Ctrl-C");
            }
            let _ = shutdown_tx.send(true);
        });

        println!(
            "Watching, {} pending. Press Ctrl-C to stop.",
            quest.pending_count().await
        );
        quest.watch(shutdown_rx).await?;

        ctrl_c.abort();
        probe.await?;
        println!("Stopped, {} pending", quest.pending_count().await);
        Ok(())
    }
}
