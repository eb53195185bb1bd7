//! AnswerDaemon - Bounded Conversational RAG Pipeline
//!
//! CLI entry point for asking questions and inspecting configuration.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use answerdaemon::cli::{Cli, Command};
use answerdaemon::config::Config;
use answerdaemon::policy::{DomainPolicies, FailSafeMode};
use answerdaemon::runner::{AskRequest, Pipeline};

fn setup_logging(cli_log_level: Option<&str>) {
    let filter = match cli_log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref());

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("answerdaemon loaded config: provider={}", config.llm.provider);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Ask {
            query,
            session,
            user,
            domain,
            idempotency_key,
            json,
        } => cmd_ask(config, query, session, user, domain, idempotency_key, json).await,
        Command::Doctor => cmd_doctor(&config),
        Command::Policies => cmd_policies(),
    }
}

/// Run one question through the pipeline
#[allow(clippy::too_many_arguments)]
async fn cmd_ask(
    config: Config,
    query: String,
    session: String,
    user: String,
    domain: Option<String>,
    idempotency_key: Option<String>,
    json: bool,
) -> Result<()> {
    debug!(%query, %session, "cmd_ask: called");
    config.validate()?;

    let pipeline = Pipeline::builder(config).build()?;

    let mut request = AskRequest::new(query, session, user);
    request.domain_hint = domain;
    request.idempotency_key = idempotency_key;

    let response = pipeline.handle(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.answer);

    if !response.citations.is_empty() {
        println!();
        println!("{}", "Sources:".bold());
        for citation in &response.citations {
            println!("  [{}] {}", citation.source_id.cyan(), citation.title);
        }
    }

    if response.rag_unavailable {
        println!();
        println!("{}", "⚠ No supporting documents were found for this answer".yellow());
    }

    Ok(())
}

/// Check configuration and environment
fn cmd_doctor(config: &Config) -> Result<()> {
    debug!("cmd_doctor: called");
    println!("AnswerDaemon Doctor");
    println!("-------------------");

    match std::env::var(&config.llm.api_key_env) {
        Ok(_) => println!("{} API key present ({})", "✓".green(), config.llm.api_key_env),
        Err(_) => println!("{} API key missing ({})", "✗".red(), config.llm.api_key_env),
    }

    println!("{} Provider: {} / {}", "✓".green(), config.llm.provider, config.llm.model);
    println!(
        "{} Loop bounds: {} replans, {} retries",
        "✓".green(),
        config.pipeline.max_replans,
        config.pipeline.max_retries
    );

    match &config.retrieval.corpus_path {
        Some(path) if path.exists() => {
            println!("{} Corpus: {}", "✓".green(), path.display());
        }
        Some(path) => {
            println!("{} Corpus not found: {}", "✗".red(), path.display());
        }
        None => {
            println!("{} Corpus: builtin", "✓".green());
        }
    }

    if config.memory.ephemeral {
        println!("{} Memory: ephemeral (no persistence)", "✓".green());
    } else {
        println!("{} Memory: {}", "✓".green(), config.memory.store_path.display());
    }

    Ok(())
}

/// List domain policies
fn cmd_policies() -> Result<()> {
    debug!("cmd_policies: called");
    let policies = DomainPolicies::builtin();

    println!("Domain policies:");
    println!();
    for policy in policies.iter() {
        let mode = match policy.fail_safe {
            FailSafeMode::Strict => "strict".red(),
            FailSafeMode::Relaxed => "relaxed".green(),
        };
        println!("  {} ({})", policy.name.cyan(), mode);
        if policy.auto_sufficient {
            println!("    auto-sufficient observation fast path");
        }
        if policy.citation_pattern.is_some() {
            println!("    enforces citation ID format");
        }
        if let Some(question) = &policy.trailing_question {
            println!("    trailing question: {question}");
        }
        if !policy.keywords.is_empty() {
            println!("    keywords: {}", policy.keywords.join(", "));
        }
        println!();
    }

    Ok(())
}
