use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::info;

use memorystore::SessionStore;
use memorystore::cli::{Cli, Command};
use memorystore::config::Config;

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("memorystore starting");

    let store = SessionStore::open(&config.store_path)
        .context(format!("Failed to open store at {}", config.store_path.display()))?;

    match cli.command {
        Command::List => {
            let listings = store.list()?;
            if listings.is_empty() {
                println!("No sessions found");
            } else {
                for l in listings {
                    println!(
                        "{}  facts={} window={} updated={}",
                        l.session_id.cyan(),
                        l.fact_count,
                        l.window_len,
                        format_timestamp(l.updated_at).dimmed()
                    );
                }
            }
        }
        Command::Show { session_id } => match store.load(&session_id)? {
            Some(record) => {
                println!("Session: {}", record.session_id.cyan());
                println!("Updated: {}", format_timestamp(record.updated_at));
                println!("Summary: {}", if record.summary.is_empty() { "(none)" } else { &record.summary });
                println!("Facts:");
                for fact in &record.facts {
                    println!("  - {fact}");
                }
                println!("Window:");
                for msg in &record.window {
                    println!("  [{}] {}", msg.role.yellow(), msg.content);
                }
            }
            None => {
                println!("No record for session: {session_id}");
            }
        },
        Command::Delete { session_id } => {
            if store.delete(&session_id)? {
                println!("{} Deleted session: {}", "✓".green(), session_id);
            } else {
                println!("No record for session: {session_id}");
            }
        }
        Command::Prune { days } => {
            let days = days.unwrap_or(config.prune_days);
            let removed = store.prune(days)?;
            println!("{} Pruned {} session(s) older than {} days", "✓".green(), removed, days);
        }
    }

    Ok(())
}
