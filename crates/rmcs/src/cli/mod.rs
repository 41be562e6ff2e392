//! Command-line interface for rmcs.
//!
//! This module provides the CLI structure for the `rmcs` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DeviceCommand, DeviceTypeArgs, DeviceTypeCommand, EventCommand, FormatArg,
    ScrapeConfigCommand, StatusCommand,
};

use crate::logging::Verbosity;

/// rmcs - Track event device deployments and generate Prometheus scrape configs
#[derive(Debug, Parser)]
#[command(name = "rmcs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the device type catalog
    #[command(subcommand)]
    DeviceType(DeviceTypeCommand),

    /// Manage events
    #[command(subcommand)]
    Event(EventCommand),

    /// Manage devices deployed at events
    #[command(subcommand)]
    Device(DeviceCommand),

    /// Print the Prometheus scrape config for an event
    ScrapeConfig(ScrapeConfigCommand),

    /// Show database status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Debug,
            }
        }
    }
}
