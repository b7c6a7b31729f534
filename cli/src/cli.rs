// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf, sync::Arc};

use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use futures::{FutureExt, future::BoxFuture};
use questsync_core::{APP_NAME, Quest};
use questsync_remote::ProgressClient;
use tracing_subscriber::EnvFilter;

use crate::cmd_cleanup::CmdCleanup;
use crate::cmd_generate_completion::CmdGenerateCompletion;
use crate::cmd_plan::{CmdPlanImport, CmdPlanShow};
use crate::cmd_progress::{CmdRecord, CmdRemove};
use crate::cmd_setting::{CmdSettingGet, CmdSettingSet};
use crate::cmd_sync::{CmdPending, CmdStatus, CmdSync, CmdWatch};
use crate::config::{Config, parse_config};
use crate::probe::Probe;

/// Run the questsync command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    match Cli::parse() {
        Ok(cli) => {
            init_tracing(cli.verbose);
            if let Err(e) = cli.run().await {
                println!("{} {}", "Error:".red(), e);
            }
        }
        Err(e) => println!("{} {}", "Error:".red(), e),
    };
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// Treat the remote store as unreachable
    pub offline: bool,

    /// Show debug logs
    pub verbose: bool,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Track your Bible reading plan offline, sync it when you are back online.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(false) // allow default to status
            .arg_required_else_help(false)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $XDG_CONFIG_HOME/questsync/config.toml on Linux and MacOS, \
%LOCALAPPDATA%/questsync/config.toml on Windows.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath)
                    .global(true),
            )
            .arg(
                arg!(--offline "Skip the remote store and queue every change locally")
                    .global(true),
            )
            .arg(arg!(-v --verbose "Show debug logs").global(true))
            .subcommand(CmdStatus::command())
            .subcommand(CmdRecord::command())
            .subcommand(CmdRemove::command())
            .subcommand(CmdPending::command())
            .subcommand(CmdSync::command())
            .subcommand(CmdWatch::command())
            .subcommand(CmdCleanup::command())
            .subcommand(
                Command::new("plan")
                    .about("Manage the cached reading plan")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdPlanShow::command())
                    .subcommand(CmdPlanImport::command()),
            )
            .subcommand(
                Command::new("setting")
                    .about("Read and write local settings")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdSettingGet::command())
                    .subcommand(CmdSettingSet::command()),
            )
            .subcommand(CmdGenerateCompletion::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::*;
        let command = match matches.subcommand() {
            Some((CmdStatus::NAME, matches)) => Status(CmdStatus::from(matches)),
            Some((CmdRecord::NAME, matches)) => Record(CmdRecord::from(matches)),
            Some((CmdRemove::NAME, matches)) => Remove(CmdRemove::from(matches)),
            Some((CmdPending::NAME, matches)) => Pending(CmdPending::from(matches)),
            Some((CmdSync::NAME, matches)) => ForceSync(CmdSync::from(matches)),
            Some((CmdWatch::NAME, matches)) => Watch(CmdWatch::from(matches)),
            Some((CmdCleanup::NAME, matches)) => Cleanup(CmdCleanup::from(matches)),
            Some(("plan", matches)) => match matches.subcommand() {
                Some((CmdPlanShow::NAME, matches)) => PlanShow(CmdPlanShow::from(matches)),
                Some((CmdPlanImport::NAME, matches)) => PlanImport(CmdPlanImport::from(matches)),
                _ => unreachable!(),
            },
            Some(("setting", matches)) => match matches.subcommand() {
                Some((CmdSettingGet::NAME, matches)) => SettingGet(CmdSettingGet::from(matches)),
                Some((CmdSettingSet::NAME, matches)) => SettingSet(CmdSettingSet::from(matches)),
                _ => unreachable!(),
            },
            Some((CmdGenerateCompletion::NAME, matches)) => {
                GenerateCompletion(CmdGenerateCompletion::from(matches))
            }
            None => Status(CmdStatus {
                output_format: crate::util::ArgOutputFormat::Table,
            }),
            _ => unreachable!(),
        };

        let config = matches.get_one("config").cloned();
        let offline = matches.get_flag("offline");
        let verbose = matches.get_flag("verbose");
        Ok(Cli {
            config,
            offline,
            verbose,
            command,
        })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config, self.offline).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Show connectivity, pending changes and today's reading
    Status(CmdStatus),

    /// Mark a day as read
    Record(CmdRecord),

    /// Clear the read mark of a day
    Remove(CmdRemove),

    /// List changes waiting for the remote store
    Pending(CmdPending),

    /// Push every pending change now
    ForceSync(CmdSync),

    /// Sync whenever the remote store becomes reachable
    Watch(CmdWatch),

    /// Remove old synced changes and cached chapters
    Cleanup(CmdCleanup),

    /// Show the readings of a day
    PlanShow(CmdPlanShow),

    /// Replace the cached reading plan
    PlanImport(CmdPlanImport),

    /// Print a setting
    SettingGet(CmdSettingGet),

    /// Store a setting
    SettingSet(CmdSettingSet),

    /// Generate shell completion
    GenerateCompletion(CmdGenerateCompletion),
}

impl Commands {
    /// Run the command with the given configuration
    #[rustfmt::skip]
    pub async fn run(self, config: Option<PathBuf>, offline: bool) -> Result<(), Box<dyn Error>> {
        use Commands::*;
        match self {
            Status(a)     => Self::run_with(config, offline, |x, c| a.run(x, c).boxed()).await,
            Record(a)     => Self::run_with(config, offline, |x, _| a.run(x).boxed()).await,
            Remove(a)     => Self::run_with(config, offline, |x, _| a.run(x).boxed()).await,
            Pending(a)    => Self::run_with(config, offline, |x, _| a.run(x).boxed()).await,
            ForceSync(a)  => Self::run_with(config, offline, |x, _| a.run(x).boxed()).await,
            Watch(a)      => Self::run_with(config, offline, |x, c| a.run(x, c).boxed()).await,
            Cleanup(a)    => Self::run_with(config, offline, |x, _| a.run(x).boxed()).await,
            PlanShow(a)   => Self::run_with(config, offline, |x, _| a.run(x).boxed()).await,
            PlanImport(a) => Self::run_with(config, offline, |x, _| a.run(x).boxed()).await,
            SettingGet(a) => Self::run_with(config, offline, |x, _| a.run(x).boxed()).await,
            SettingSet(a) => Self::run_with(config, offline, |x, _| a.run(x).boxed()).await,
            GenerateCompletion(a) => a.run(),
        }
    }

    async fn run_with<F>(config: Option<PathBuf>, offline: bool, f: F) -> Result<(), Box<dyn Error>>
    where
        F: for<'a> FnOnce(&'a mut Quest, &'a Context) -> BoxFuture<'a, Result<(), Box<dyn Error>>>,
    {
        tracing::debug!("parsing configuration...");
        let (core_config, config) = parse_config(config).await?;

        let client = ProgressClient::new(config.remote.clone())?;
        let probe = Probe::new(client.clone(), offline);
        let online = probe.check().await;
        tracing::debug!(online, "probed remote store");

        let mut quest = Quest::new(core_config, Arc::new(client.clone()), online).await?;
        let ctx = Context {
            config,
            probe,
            client,
        };
        let result = f(&mut quest, &ctx).await;

        quest.close().await;
        result
    }
}

/// What a command may need besides the core.
#[derive(Debug)]
pub struct Context {
    /// Settings of the command-line interface.
    pub config: Config,

    /// Connectivity probe of the remote store.
    pub probe: Probe,

    /// Client of the remote store, for reads the core doesn't cover.
    pub client: ProgressClient,
}
