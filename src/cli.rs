//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// A declarative cloud stack builder that hands validated plans to an
/// external orchestration engine.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the stack configuration file to use.
    #[arg(short, long, value_name = "FILE", default_value = "Kumofile")]
    pub file: PathBuf,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Orchestration engine executable (overrides KUMO_ENGINE).
    #[arg(long, value_name = "PROGRAM")]
    pub engine: Option<PathBuf>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `up` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Parse command-line arguments, providing `up` as the default command.
    #[must_use]
    pub fn parse_with_default() -> Self {
        Self::parse().with_default_command()
    }

    /// Parse the provided arguments, applying the default command when needed.
    ///
    /// # Panics
    ///
    /// Panics if argument parsing fails.
    #[must_use]
    pub fn parse_from_with_default<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
            .unwrap_or_else(|e| panic!("CLI parsing failed: {e}"))
            .with_default_command()
    }

    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Up(UpArgs { emit: None }));
        }
        self
    }
}

/// Arguments accepted by the `up` command.
#[derive(Debug, Args, PartialEq, Eq, Clone, Default)]
pub struct UpArgs {
    /// Write the generated plan to this path and retain it.
    #[arg(long, value_name = "FILE")]
    pub emit: Option<PathBuf>,
}

/// Available top-level commands for kumo.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Build and validate the graph, then apply it through the engine
    /// `default`.
    Up(UpArgs),

    /// Show the declarations and dependency edges without applying.
    Preview,

    /// Display the resource dependency graph in DOT format for
    /// visualization.
    Graph,

    /// Write the engine plan to the specified file without invoking the
    /// engine.
    Plan {
        /// Output path for the generated plan file.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}
