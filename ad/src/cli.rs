//! CLI argument parsing for answerdaemon

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ad")]
#[command(author, version, about = "Bounded conversational RAG pipeline", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask a question
    Ask {
        /// The question to answer
        #[arg(required = true)]
        query: String,

        /// Session ID for conversation memory
        #[arg(short, long, default_value = "default")]
        session: String,

        /// User ID attached to drafts and tool calls
        #[arg(short, long, default_value = "anonymous")]
        user: String,

        /// Domain hint; skips intent classification when valid
        #[arg(short, long)]
        domain: Option<String>,

        /// Idempotency key; repeats within the TTL replay the stored response
        #[arg(short, long)]
        idempotency_key: Option<String>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check configuration and environment
    Doctor,

    /// List domain policies
    Policies,
}
