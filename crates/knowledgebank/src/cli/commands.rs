//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind (overrides the configuration)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Port to listen on (overrides the configuration)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text looked up in titles and descriptions
    pub query: String,

    /// Restrict results to one resource type
    #[arg(short = 't', long = "type", default_value = "")]
    pub resource_type: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Browse command arguments.
#[derive(Debug, Args)]
pub struct BrowseCommand {
    /// Only show resources carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Upload command arguments.
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Resource title (defaults to the file name)
    #[arg(long, default_value = "")]
    pub title: String,

    /// Resource description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Resource type
    #[arg(short = 't', long = "type", default_value = "")]
    pub resource_type: String,

    /// Comma separated tags
    #[arg(long, default_value = "")]
    pub tags: String,

    /// External link
    #[arg(short, long, default_value = "")]
    pub url: String,

    /// File to attach
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSON document holding an array of resources
    pub file: PathBuf,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Destination file (stdout if omitted)
    pub file: Option<PathBuf>,
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

/// Data source argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// A static JSON document
    Static,
    /// The backend API
    Api,
}

impl From<SourceArg> for crate::config::SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Static => Self::Static,
            SourceArg::Api => Self::Api,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// The rendered results container
    Html,
    /// JSON output
    Json,
}
