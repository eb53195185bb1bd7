//! CLI argument parsing for memorystore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ms")]
#[command(author, version, about = "Session memory store for answerdaemon", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all sessions
    List,

    /// Show the full record for a session
    Show {
        /// Session ID
        #[arg(required = true)]
        session_id: String,
    },

    /// Delete a session record
    Delete {
        /// Session ID to delete
        #[arg(required = true)]
        session_id: String,
    },

    /// Remove sessions older than the configured age
    Prune {
        /// Age threshold in days (overrides config)
        #[arg(short, long)]
        days: Option<u32>,
    },
}
