//! Command line interface.

use clap::{Parser, ValueEnum};
use std::{io::IsTerminal, path::PathBuf};
use termcolor::ColorChoice;

use crate::db::cmd::DbCommand;


#[derive(Debug, Parser)]
#[clap(about = "GraphQL backend for the Jotter note-taking app.")]
pub(crate) struct Args {
    #[clap(subcommand)]
    pub(crate) cmd: Command,

    /// Whether to use colors when printing to the terminal and in the log.
    #[clap(long, global = true, value_enum, default_value_t = Color::Auto)]
    pub(crate) color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Color {
    Auto,
    Always,
    Never,
}

impl Args {
    pub(crate) fn stdout_color(&self) -> ColorChoice {
        self.color_choice(std::io::stdout().is_terminal())
    }

    pub(crate) fn stderr_color(&self) -> ColorChoice {
        self.color_choice(std::io::stderr().is_terminal())
    }

    fn color_choice(&self, is_terminal: bool) -> ColorChoice {
        match self.color {
            Color::Always => ColorChoice::Always,
            Color::Never => ColorChoice::Never,
            Color::Auto if is_terminal => ColorChoice::Auto,
            Color::Auto => ColorChoice::Never,
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Command {
    /// Serves the GraphQL API over HTTP.
    Serve {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Inspects or migrates the Postgres store.
    Db {
        #[clap(subcommand)]
        cmd: DbCommand,

        #[clap(flatten)]
        shared: Shared,
    },

    /// Loads the config and tries to connect to the store. Exits with 1 if
    /// anything failed.
    Check {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Prints a documented config file with all options and their defaults.
    WriteConfig {
        /// Write to this file instead of stdout.
        target: Option<PathBuf>,
    },

    /// Prints the GraphQL schema in SDL.
    ExportApiSchema {
        /// Write to this file instead of stdout.
        target: Option<PathBuf>,
    },
}

impl Command {
    /// Name used in log file paths.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Serve { .. } => "serve",
            Self::Db { .. } => "db",
            Self::Check { .. } => "check",
            Self::WriteConfig { .. } | Self::ExportApiSchema { .. } => "other",
        }
    }
}

#[derive(Debug, clap::Args)]
pub(crate) struct Shared {
    /// Path to the configuration file. If this is not specified, Jotter will
    /// check `JOTTER_CONFIG_PATH` and then try opening `config.toml` or
    /// `/etc/jotter/config.toml`.
    #[clap(short, long)]
    pub(crate) config: Option<PathBuf>,
}
