// ABOUTME: Nutrition enrichment pipeline: normalisation, dataset search, fallback tiers, scoring
// ABOUTME: Groups the orchestrator with the strategies and lookup tables it draws on
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Nutrition enrichment

/// Streaming best-match search over the bulk dataset
pub mod dataset_search;
/// Orchestrator and meal analysis
pub mod enrichment;
/// Source-language to canonical term mapping
pub mod normalizer;
/// Fallback chain tiers
pub mod resolvers;
/// Letter grade and component levels
pub mod scoring;
/// Curated per-100 g table
pub mod static_foods;

pub use dataset_search::DatasetSearchEngine;
pub use enrichment::{EnrichmentService, MealAnalysis};
pub use normalizer::TermNormalizer;
pub use resolvers::ResolutionStrategy;
pub use scoring::{Grade, Level, NutrientLevels};
