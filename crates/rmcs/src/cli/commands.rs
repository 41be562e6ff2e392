//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::DeviceTypeInput;
use crate::scrape::ScrapeFormat;

/// Device type catalog commands.
#[derive(Debug, Subcommand)]
pub enum DeviceTypeCommand {
    /// List all device types
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a device type to the catalog
    Add(DeviceTypeArgs),

    /// Replace the fields of an existing device type
    Edit {
        /// Device type id
        id: i64,

        /// Replacement fields
        #[command(flatten)]
        fields: DeviceTypeArgs,
    },
}

/// Device type fields.
#[derive(Debug, Clone, Args)]
pub struct DeviceTypeArgs {
    /// Unique display name
    #[arg(short, long)]
    pub name: String,

    /// Prometheus job name
    #[arg(short, long)]
    pub job_name: String,

    /// Metrics endpoint path (defaults to the configured path)
    #[arg(short, long)]
    pub metrics_path: Option<String>,

    /// Exporter port (defaults to the configured port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl From<DeviceTypeArgs> for DeviceTypeInput {
    fn from(args: DeviceTypeArgs) -> Self {
        Self {
            name: args.name,
            job_name: args.job_name,
            metrics_path: args.metrics_path,
            port: args.port,
        }
    }
}

/// Event commands.
#[derive(Debug, Subcommand)]
pub enum EventCommand {
    /// List all events
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Create an event
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Date, free-form (e.g. "2024-01-01")
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show an event and its devices
    Show {
        /// Event id
        id: i64,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Device commands.
#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Deploy a device at an event
    Add {
        /// Event id
        event_id: i64,

        /// Device type id
        #[arg(short = 't', long)]
        type_id: i64,

        /// Exporter address
        #[arg(short, long)]
        ip: String,
    },
}

/// Scrape config command arguments.
#[derive(Debug, Args)]
pub struct ScrapeConfigCommand {
    /// Event id
    pub event_id: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: FormatArg,

    /// Fail if a device references a missing device type
    #[arg(long)]
    pub strict: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Scrape config output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    /// YAML
    #[default]
    Yaml,
    /// JSON
    Json,
}

impl From<FormatArg> for ScrapeFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Yaml => Self::Yaml,
            FormatArg::Json => Self::Json,
        }
    }
}
