// ABOUTME: Interchangeable resolution strategies forming the enrichment fallback chain
// ABOUTME: Dataset search, external search, static table, and the generic default floor
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Resolution strategies
//!
//! Each tier of the fallback chain implements [`ResolutionStrategy`]. The
//! orchestrator tries them in order and keeps the first `Some`. Strategies
//! never return errors: anything that goes wrong inside a tier is logged and
//! reported as "no match" so the next tier gets its turn.

use crate::constants::enrichment::{
    DEFAULT_MATCH_SCORE, EXTERNAL_MATCH_SCORE, STATIC_MATCH_SCORE,
};
use crate::external::food_search::ExternalFoodSearch;
use crate::models::{CandidateItem, DatasetRecord, Macros, MatchResult, MatchSource};
use crate::nutrition::dataset_search::DatasetSearchEngine;
use crate::nutrition::normalizer::TermNormalizer;
use crate::nutrition::static_foods;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Values assigned when no tier recognises an item (per 100 g)
pub const GENERIC_DEFAULT_MACROS: Macros = Macros {
    calories: 150.0,
    carbs: 15.0,
    protein: 8.0,
    fat: 6.0,
    fiber: 2.0,
    sugar: 3.0,
    salt: None,
};

/// One tier of the fallback chain
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    /// Tier tag attached to matches from this strategy
    fn source(&self) -> MatchSource;

    /// Resolve `item`, or `None` to defer to the next tier
    async fn try_resolve(&self, item: &CandidateItem) -> Option<MatchResult>;
}

/// Bulk dataset tier: each search term is tried in order until one matches
pub struct DatasetStrategy {
    engine: DatasetSearchEngine,
}

impl DatasetStrategy {
    /// Wrap a search engine
    #[must_use]
    pub const fn new(engine: DatasetSearchEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ResolutionStrategy for DatasetStrategy {
    fn source(&self) -> MatchSource {
        MatchSource::Dataset
    }

    async fn try_resolve(&self, item: &CandidateItem) -> Option<MatchResult> {
        for term in item.effective_terms() {
            // The engine scores the term and its canonical form together
            if let Some(found) = self.engine.search(&[term.to_owned()]).await {
                debug!(
                    item = %item.name,
                    term,
                    score = found.score,
                    product = %found.record.product_name,
                    "Dataset match"
                );
                return Some(found);
            }
        }
        None
    }
}

/// External search tier: one bounded call with the item's primary term
pub struct ExternalStrategy {
    search: Arc<dyn ExternalFoodSearch>,
    normalizer: &'static TermNormalizer,
    timeout: Duration,
}

impl ExternalStrategy {
    /// Wrap an external search with a per-call timeout
    #[must_use]
    pub fn new(search: Arc<dyn ExternalFoodSearch>, timeout: Duration) -> Self {
        Self {
            search,
            normalizer: TermNormalizer::shared(),
            timeout,
        }
    }
}

#[async_trait]
impl ResolutionStrategy for ExternalStrategy {
    fn source(&self) -> MatchSource {
        MatchSource::Internet
    }

    async fn try_resolve(&self, item: &CandidateItem) -> Option<MatchResult> {
        let query = self.normalizer.normalize(item.primary_term());
        if query.trim().is_empty() {
            return None;
        }

        let found = match tokio::time::timeout(self.timeout, self.search.lookup(&query)).await {
            Ok(Ok(found)) => found?,
            Ok(Err(e)) => {
                warn!(
                    adapter = self.search.name(),
                    query = %query,
                    "External food search failed: {}", e
                );
                return None;
            }
            Err(_) => {
                warn!(
                    adapter = self.search.name(),
                    query = %query,
                    timeout_ms = self.timeout.as_millis(),
                    "External food search timed out"
                );
                return None;
            }
        };

        if !found.is_usable() {
            return None;
        }

        let nutrients = found.to_macros();
        Some(MatchResult {
            record: DatasetRecord {
                product_name: found.description,
                nutrients,
                has_energy: nutrients.calories > 0.0,
                has_protein: nutrients.protein > 0.0,
                ..DatasetRecord::default()
            },
            score: EXTERNAL_MATCH_SCORE,
            source: MatchSource::Internet,
        })
    }
}

/// Curated static table tier
#[derive(Debug, Clone, Copy)]
pub struct StaticTableStrategy {
    normalizer: &'static TermNormalizer,
}

impl StaticTableStrategy {
    /// Static tier using the shared normalizer
    #[must_use]
    pub fn new() -> Self {
        Self {
            normalizer: TermNormalizer::shared(),
        }
    }
}

impl Default for StaticTableStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResolutionStrategy for StaticTableStrategy {
    fn source(&self) -> MatchSource {
        MatchSource::Fallback
    }

    async fn try_resolve(&self, item: &CandidateItem) -> Option<MatchResult> {
        let mut names: Vec<String> = vec![item.name.clone()];
        names.extend(item.effective_terms().into_iter().map(str::to_owned));
        let canonical: Vec<String> = names
            .iter()
            .map(|name| self.normalizer.normalize(name))
            .collect();
        names.extend(canonical);

        let food = static_foods::lookup(names.iter().map(String::as_str))?;
        Some(MatchResult {
            record: food.to_record(),
            score: STATIC_MATCH_SCORE,
            source: MatchSource::Fallback,
        })
    }
}

/// Floor of the chain: always resolves
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDefaultStrategy;

impl GenericDefaultStrategy {
    /// The default match for `item`
    #[must_use]
    pub fn default_match(item: &CandidateItem) -> MatchResult {
        MatchResult {
            record: DatasetRecord {
                product_name: item.name.clone(),
                nutrients: GENERIC_DEFAULT_MACROS,
                has_energy: true,
                has_protein: true,
                ..DatasetRecord::default()
            },
            score: DEFAULT_MATCH_SCORE,
            source: MatchSource::Default,
        }
    }
}

#[async_trait]
impl ResolutionStrategy for GenericDefaultStrategy {
    fn source(&self) -> MatchSource {
        MatchSource::Default
    }

    async fn try_resolve(&self, item: &CandidateItem) -> Option<MatchResult> {
        Some(Self::default_match(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_tier_matches_translated_name() {
        let item = CandidateItem::new("Peito de frango", vec![], 1.0, "");
        let found = StaticTableStrategy::new().try_resolve(&item).await.unwrap();
        assert_eq!(found.source, MatchSource::Fallback);
        assert_eq!(found.record.product_name, "chicken breast");
        assert!(found.record.nutrients.carbs.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_default_tier_always_resolves() {
        let item = CandidateItem::new("", vec![], 1.0, "");
        let found = GenericDefaultStrategy.try_resolve(&item).await.unwrap();
        assert_eq!(found.source, MatchSource::Default);
        assert_eq!(found.record.nutrients, GENERIC_DEFAULT_MACROS);
    }
}
