// ABOUTME: Library entry point for the nutrition enrichment core
// ABOUTME: Resolves loosely described food items to macro-nutrients and grades meals
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy
#![deny(unsafe_code)]

//! # Nutrition Enrichment
//!
//! Turns food items extracted upstream (free-text name, candidate search
//! terms, quantity, unit) into macro-nutrient values, then sums and grades
//! the meal.
//!
//! ## Features
//!
//! - **Dataset search**: bounded streaming scan of a bulk product export
//! - **Fallback chain**: dataset, external search, curated table, generic default
//! - **Scoring**: A-E letter grade and low/medium/high component levels
//! - **Dataset refresh**: background download, decode, and atomic install
//!
//! ## Architecture
//!
//! - **`nutrition`**: normalizer, search engine, strategies, orchestrator, scorer
//! - **`external`**: USDA `FoodData` Central client and the external search contract
//! - **`dataset`**: refresh manager, codecs, and refresh status
//! - **`config`**: environment-driven configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nutrition_enrichment::config::EnrichmentConfig;
//! use nutrition_enrichment::models::CandidateItem;
//! use nutrition_enrichment::nutrition::EnrichmentService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EnrichmentConfig::from_env()?;
//!     let service = EnrichmentService::new(config);
//!
//!     let items = vec![CandidateItem::new("Feijão", vec!["feijão".into()], 120.0, "g")];
//!     let analysis = service.analyze(&items).await;
//!     println!("{} -> grade {}", analysis.items[0].source, analysis.grade);
//!     Ok(())
//! }
//! ```

/// Environment-driven configuration
pub mod config;

/// Crate-wide constants and environment variable names
pub mod constants;

/// Dataset refresh pipeline and status
pub mod dataset;

/// Unified error handling
pub mod errors;

/// External food search sources
pub mod external;

/// Structured logging setup
pub mod logging;

/// Candidate items, dataset records, matches, and totals
pub mod models;

/// Enrichment pipeline and scoring
pub mod nutrition;
