//! Command-line interface for knowledgebank.
//!
//! This module provides the CLI structure for the `kbank` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, SourceKind};

pub use commands::{
    BrowseCommand, ConfigCommand, ExportCommand, ImportCommand, OutputFormat, SearchCommand,
    ServeCommand, SourceArg, UploadCommand,
};

/// kbank - Search and share a directory of resources
///
/// Browse a resource catalog from a JSON document or a backend API, upload
/// new resources, or run the backend yourself.
#[derive(Debug, Parser)]
#[command(name = "kbank")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Data source to read from for this run
    #[arg(long, global = true, value_enum)]
    pub source: Option<SourceArg>,

    /// Document location (static) or backend base URL (api) for this run
    #[arg(long, global = true, value_name = "URL")]
    pub location: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the backend server
    Serve(ServeCommand),

    /// Search resources by text and type
    Search(SearchCommand),

    /// List resources, optionally narrowed to a tag
    Browse(BrowseCommand),

    /// Upload a resource to the backend
    Upload(UploadCommand),

    /// Load resources from a JSON document into the local store
    Import(ImportCommand),

    /// Write the local store out as a JSON document
    Export(ExportCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// Apply the global source flags on top of a loaded configuration.
    ///
    /// `--location` goes to the document location or the API base URL,
    /// whichever the effective source uses.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(source) = self.source {
            config.source.kind = source.into();
        }
        if let Some(location) = &self.location {
            match config.source.kind {
                SourceKind::Static => config.source.location.clone_from(location),
                SourceKind::Api => config.source.api_base_url.clone_from(location),
            }
        }
    }
}
