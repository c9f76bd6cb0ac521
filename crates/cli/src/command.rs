//! Command-line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use custody_core::types::DbId;

#[derive(Debug, Parser)]
#[command(name = "custody")]
#[command(version)]
#[command(about = "Track which worker holds which piece of hardware", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show the pre-arrange view for the selected hardware
    Prepare {
        /// Selected hardware ids, in selection order
        #[arg(required = true, num_args = 1..)]
        asset_ids: Vec<DbId>,
    },
    /// Apply an arrangement request (JSON)
    Process {
        /// Request file, or "-" to read stdin
        #[arg(value_name = "FILE", value_parser = parse_source)]
        source: RequestSource,
    },
    /// Show the arrangement journal of one asset, newest first
    History { asset_id: DbId },
    /// Show the hardware a worker currently holds
    Holdings { worker_id: DbId },
}

/// Where `process` reads its JSON request from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSource {
    Stdin,
    File(PathBuf),
}

fn parse_source(raw: &str) -> Result<RequestSource, String> {
    match raw {
        "" => Err("path must not be empty".into()),
        "-" => Ok(RequestSource::Stdin),
        path => Ok(RequestSource::File(PathBuf::from(path))),
    }
}
