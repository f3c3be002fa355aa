// ABOUTME: Enrichment orchestrator resolving candidate items through the fallback chain
// ABOUTME: Runs items concurrently, preserves input order, and aggregates meal totals and grade
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Enrichment Orchestrator
//!
//! Every [`CandidateItem`] walks the ordered strategy list:
//!
//! 1. dataset search, term by term
//! 2. external search with the primary term
//! 3. curated static table
//! 4. generic default values
//!
//! Items are independent and resolved concurrently up to
//! `limits.max_concurrent_items`. Output order always equals input order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nutrition_enrichment::config::EnrichmentConfig;
//! use nutrition_enrichment::models::CandidateItem;
//! use nutrition_enrichment::nutrition::enrichment::EnrichmentService;
//!
//! # async fn example() {
//! let service = EnrichmentService::new(EnrichmentConfig::default());
//! let analysis = service
//!     .analyze(&[CandidateItem::new("arroz", vec!["arroz".into()], 150.0, "g")])
//!     .await;
//! println!("{} kcal, grade {}", analysis.totals.rounded().calories, analysis.grade);
//! # }
//! ```

use crate::config::EnrichmentConfig;
use crate::external::food_search;
use crate::models::{CandidateItem, EnrichedItem, MatchSource, NutritionTotals};
use crate::nutrition::dataset_search::DatasetSearchEngine;
use crate::nutrition::resolvers::{
    DatasetStrategy, ExternalStrategy, GenericDefaultStrategy, ResolutionStrategy,
    StaticTableStrategy,
};
use crate::nutrition::scoring::{self, Grade, NutrientLevels};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Enriched items with their totals, grade, and levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysis {
    /// Enriched items in input order
    pub items: Vec<EnrichedItem>,
    /// Unrounded totals of the items' portion macros
    pub totals: NutritionTotals,
    /// Letter grade of the totals
    pub grade: Grade,
    /// Component levels of the totals
    pub levels: NutrientLevels,
}

/// Sum the portion macros of `items` without intermediate rounding
#[must_use]
pub fn sum_totals(items: &[EnrichedItem]) -> NutritionTotals {
    items.iter().collect()
}

/// Resolves candidate items to nutrition values
#[derive(Clone)]
pub struct EnrichmentService {
    strategies: Arc<Vec<Arc<dyn ResolutionStrategy>>>,
    max_concurrent: usize,
}

impl EnrichmentService {
    /// Service with the standard four-tier chain
    ///
    /// The external tier uses USDA when an API key is configured and is a
    /// no-op otherwise.
    #[must_use]
    pub fn new(config: EnrichmentConfig) -> Self {
        let external = food_search::from_config(&config.external);
        let strategies: Vec<Arc<dyn ResolutionStrategy>> = vec![
            Arc::new(DatasetStrategy::new(DatasetSearchEngine::new(config.dataset))),
            Arc::new(ExternalStrategy::new(external, config.external.timeout)),
            Arc::new(StaticTableStrategy::new()),
            Arc::new(GenericDefaultStrategy),
        ];
        Self::with_strategies(strategies, config.limits.max_concurrent_items)
    }

    /// Service with a custom chain
    ///
    /// [`GenericDefaultStrategy`] is appended when the chain does not already
    /// end with a default tier, so every item still resolves.
    #[must_use]
    pub fn with_strategies(
        mut strategies: Vec<Arc<dyn ResolutionStrategy>>,
        max_concurrent: usize,
    ) -> Self {
        let has_floor = strategies
            .last()
            .is_some_and(|last| last.source() == MatchSource::Default);
        if !has_floor {
            strategies.push(Arc::new(GenericDefaultStrategy));
        }
        Self {
            strategies: Arc::new(strategies),
            max_concurrent: max_concurrent.max(1),
        }
    }

    async fn resolve(&self, item: &CandidateItem) -> EnrichedItem {
        for strategy in self.strategies.iter() {
            if let Some(found) = strategy.try_resolve(item).await {
                debug!(
                    item = %item.name,
                    source = %found.source,
                    score = found.score,
                    "Item resolved"
                );
                return EnrichedItem::from_match(item, found);
            }
        }
        EnrichedItem::from_match(item, GenericDefaultStrategy::default_match(item))
    }

    /// Enrich every item, returning exactly one result per input in input order
    pub async fn enrich(&self, items: &[CandidateItem]) -> Vec<EnrichedItem> {
        let enriched: Vec<EnrichedItem> = stream::iter(items)
            .map(|item| self.resolve(item))
            .buffered(self.max_concurrent)
            .collect()
            .await;

        info!(
            items = enriched.len(),
            from_dataset = enriched
                .iter()
                .filter(|item| item.source == MatchSource::Dataset)
                .count(),
            "Enrichment finished"
        );
        enriched
    }

    /// Enrich `items` and grade the resulting totals
    pub async fn analyze(&self, items: &[CandidateItem]) -> MealAnalysis {
        let items = self.enrich(items).await;
        let totals = sum_totals(&items);
        MealAnalysis {
            grade: scoring::grade(&totals),
            levels: scoring::levels(&totals),
            totals,
            items,
        }
    }
}
