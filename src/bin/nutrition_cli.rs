// ABOUTME: Nutrition CLI - command-line front end for enrichment, search, and dataset refresh
// ABOUTME: Reads configuration from the environment and prints results as JSON
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
//!
//! Usage:
//! ```bash
//! # Enrich a meal described as a JSON array of candidate items
//! nutrition-cli enrich --input meal.json
//!
//! # Best dataset match for one or more terms
//! nutrition-cli search "arroz integral" "brown rice"
//!
//! # Canonical form of a term
//! nutrition-cli normalize "feijão preto"
//!
//! # Download and install a fresh dataset, printing each status change
//! nutrition-cli refresh
//!
//! # Show the current refresh status
//! nutrition-cli status
//!
//! # Refresh on a fixed interval until Ctrl-C
//! nutrition-cli schedule --interval-hours 24
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nutrition_enrichment::config::EnrichmentConfig;
use nutrition_enrichment::dataset::{DatasetRefreshManager, RefreshState};
use nutrition_enrichment::logging::LoggingConfig;
use nutrition_enrichment::models::CandidateItem;
use nutrition_enrichment::nutrition::dataset_search::DatasetSearchEngine;
use nutrition_enrichment::nutrition::{normalizer, EnrichmentService};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "nutrition-cli",
    about = "Nutrition enrichment CLI",
    long_about = "Resolve food items to macro-nutrients, query the product dataset, and manage dataset refreshes."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Dataset path override
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Enrich candidate items read from a JSON file
    Enrich {
        /// JSON array of `{name, searchTerms, quantity, unit}`
        #[arg(long)]
        input: PathBuf,
    },

    /// Search the dataset for the best match
    Search {
        /// Search terms, tried together
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Print the canonical form of a term
    Normalize {
        /// Source-language term
        term: String,
    },

    /// Run one dataset refresh to completion
    Refresh,

    /// Print the refresh status
    Status,

    /// Run the periodic refresh scheduler until interrupted
    Schedule {
        /// Hours between refreshes (defaults to configuration)
        #[arg(long)]
        interval_hours: Option<u64>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging.level = "debug".to_owned();
    }
    logging.init()?;

    let mut config = EnrichmentConfig::from_env()?;
    if let Some(path) = cli.dataset {
        config.dataset.path = path;
    }

    match cli.command {
        Command::Enrich { input } => {
            let raw = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let items: Vec<CandidateItem> =
                serde_json::from_str(&raw).context("Input must be a JSON array of items")?;
            let analysis = EnrichmentService::new(config).analyze(&items).await;
            print_json(&serde_json::json!({
                "items": analysis.items,
                "totals": analysis.totals.rounded(),
                "grade": analysis.grade,
                "levels": analysis.levels,
            }))?;
        }
        Command::Search { terms } => {
            let engine = DatasetSearchEngine::new(config.dataset);
            match engine.search(&terms).await {
                Some(found) => print_json(&found)?,
                None => println!("No dataset match for {terms:?}"),
            }
        }
        Command::Normalize { term } => {
            println!("{}", normalizer::normalize(&term));
        }
        Command::Refresh => {
            let manager = DatasetRefreshManager::new(&config.dataset, config.refresh)?;
            let mut updates = manager.subscribe();
            let watcher = tokio::spawn(async move {
                while updates.changed().await.is_ok() {
                    let status = updates.borrow_and_update().clone();
                    eprintln!("{:>3}% {}", status.progress, status.state);
                    if matches!(status.state, RefreshState::Completed | RefreshState::Error) {
                        break;
                    }
                }
            });
            let result = manager.refresh_now().await;
            drop(manager);
            let _ = watcher.await;
            result?;
        }
        Command::Status => {
            let manager = DatasetRefreshManager::new(&config.dataset, config.refresh)?;
            print_json(&manager.status_report())?;
        }
        Command::Schedule { interval_hours } => {
            if !config.refresh.schedule_enabled {
                info!("Scheduled refresh disabled by configuration");
                return Ok(());
            }
            let interval = interval_hours
                .map_or(config.refresh.interval, |hours| {
                    Duration::from_secs(hours.saturating_mul(3600))
                });
            let manager = Arc::new(DatasetRefreshManager::new(
                &config.dataset,
                config.refresh,
            )?);
            let scheduler = manager.spawn_scheduler(interval)?;
            info!("Scheduler running, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            scheduler.shutdown().await;
        }
    }

    Ok(())
}
