// ABOUTME: Integration tests for the enrichment orchestrator and its fallback chain
// ABOUTME: Verifies tier order, soft external failures, order preservation, and meal analysis
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use async_trait::async_trait;
use common::{enrichment_config, init_test_logging, product_row, write_dataset};
use nutrition_enrichment::errors::{AppError, AppResult};
use nutrition_enrichment::external::{ExternalFoodSearch, PartialMacros};
use nutrition_enrichment::models::{CandidateItem, DatasetRecord, MatchResult, MatchSource};
use nutrition_enrichment::nutrition::dataset_search::DatasetSearchEngine;
use nutrition_enrichment::nutrition::enrichment::{sum_totals, EnrichmentService};
use nutrition_enrichment::nutrition::resolvers::{
    DatasetStrategy, ExternalStrategy, ResolutionStrategy, StaticTableStrategy,
    GENERIC_DEFAULT_MACROS,
};
use nutrition_enrichment::nutrition::Grade;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// External search that always errors
struct FailingSearch {
    calls: AtomicUsize,
}

#[async_trait]
impl ExternalFoodSearch for FailingSearch {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn lookup(&self, _query: &str) -> AppResult<Option<PartialMacros>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::external_unavailable("stub", "connection refused"))
    }
}

/// External search that never answers in time
struct SlowSearch;

#[async_trait]
impl ExternalFoodSearch for SlowSearch {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn lookup(&self, _query: &str) -> AppResult<Option<PartialMacros>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }
}

/// External search that knows exactly one food
struct QuinoaSearch;

#[async_trait]
impl ExternalFoodSearch for QuinoaSearch {
    fn name(&self) -> &'static str {
        "quinoa"
    }

    async fn lookup(&self, query: &str) -> AppResult<Option<PartialMacros>> {
        Ok(query.contains("quinoa").then(|| PartialMacros {
            description: "Quinoa, cooked".to_owned(),
            calories: Some(120.0),
            carbs: Some(21.3),
            protein: Some(4.4),
            fat: Some(1.9),
            fiber: Some(2.8),
            sugar: Some(0.9),
            salt: Some(0.02),
        }))
    }
}

/// Strategy that sleeps for an item-specific time, then resolves
struct DelayedStrategy;

#[async_trait]
impl ResolutionStrategy for DelayedStrategy {
    fn source(&self) -> MatchSource {
        MatchSource::Fallback
    }

    async fn try_resolve(&self, item: &CandidateItem) -> Option<MatchResult> {
        let delay_ms: u64 = item.name.trim_start_matches("item-").parse().ok()?;
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Some(MatchResult {
            record: DatasetRecord {
                product_name: item.name.clone(),
                ..DatasetRecord::default()
            },
            score: 0.6,
            source: MatchSource::Fallback,
        })
    }
}

fn item(name: &str, terms: &[&str]) -> CandidateItem {
    CandidateItem::new(
        name,
        terms.iter().map(|term| (*term).to_owned()).collect(),
        100.0,
        "g",
    )
}

fn chain(dataset: &Path, external: Arc<dyn ExternalFoodSearch>) -> EnrichmentService {
    let config = enrichment_config(dataset);
    let strategies: Vec<Arc<dyn ResolutionStrategy>> = vec![
        Arc::new(DatasetStrategy::new(DatasetSearchEngine::new(config.dataset))),
        Arc::new(ExternalStrategy::new(external, Duration::from_millis(100))),
        Arc::new(StaticTableStrategy::new()),
    ];
    EnrichmentService::with_strategies(strategies, 4)
}

#[tokio::test]
async fn test_each_tier_resolves_in_order() -> Result<()> {
    init_test_logging();
    let dir = tempfile::tempdir()?;
    let dataset = write_dataset(dir.path(), &[product_row("Pizza Margherita", 1100.0, 11.0)])?;
    let service = chain(&dataset, Arc::new(QuinoaSearch));

    let items = vec![
        item("Pizza", &["pizza"]),
        item("Quinoa bowl", &["quinoa"]),
        item("Frango grelhado", &["frango grelhado"]),
        item("Mystery stew", &["mystery stew"]),
    ];
    let enriched = service.enrich(&items).await;

    let sources: Vec<MatchSource> = enriched.iter().map(|e| e.source).collect();
    assert_eq!(
        sources,
        vec![
            MatchSource::Dataset,
            MatchSource::Internet,
            MatchSource::Fallback,
            MatchSource::Default,
        ]
    );
    assert_eq!(enriched[1].matched_name.as_deref(), Some("Quinoa, cooked"));
    assert_eq!(enriched[1].macros.salt, Some(0.02));
    assert_eq!(enriched[3].per_100g, GENERIC_DEFAULT_MACROS);
    Ok(())
}

#[tokio::test]
async fn test_external_failure_falls_through_without_error() -> Result<()> {
    init_test_logging();
    let dir = tempfile::tempdir()?;
    let dataset = write_dataset(dir.path(), &[])?;
    let failing = Arc::new(FailingSearch {
        calls: AtomicUsize::new(0),
    });
    let service = chain(&dataset, failing.clone());

    let enriched = service.enrich(&[item("Peito de frango", &[])]).await;

    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    assert_eq!(enriched.len(), 1);
    assert_eq!(enriched[0].source, MatchSource::Fallback);
    assert!(enriched[0].macros.carbs.abs() < f64::EPSILON);
    assert_eq!(enriched[0].nutrition_grade.as_deref(), Some("A"));
    Ok(())
}

#[tokio::test]
async fn test_external_timeout_is_a_soft_failure() -> Result<()> {
    init_test_logging();
    let dir = tempfile::tempdir()?;
    let dataset = write_dataset(dir.path(), &[])?;
    let service = chain(&dataset, Arc::new(SlowSearch));

    let started = std::time::Instant::now();
    let enriched = service.enrich(&[item("Unknown dish", &[])]).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(enriched[0].source, MatchSource::Default);
    Ok(())
}

#[tokio::test]
async fn test_missing_dataset_still_resolves_every_item() {
    init_test_logging();
    let service = EnrichmentService::new(enrichment_config(Path::new(
        "/nonexistent/products.csv",
    )));
    let items = vec![item("arroz", &["arroz"]), item("???", &[])];

    let enriched = service.enrich(&items).await;

    assert_eq!(enriched.len(), 2);
    assert_eq!(enriched[0].source, MatchSource::Fallback);
    assert_eq!(enriched[1].source, MatchSource::Default);
}

#[tokio::test]
async fn test_output_order_matches_input_despite_completion_order() {
    let strategies: Vec<Arc<dyn ResolutionStrategy>> = vec![Arc::new(DelayedStrategy)];
    let service = EnrichmentService::with_strategies(strategies, 8);
    let items: Vec<CandidateItem> = [80, 5, 40, 1, 60, 20]
        .iter()
        .map(|ms| CandidateItem::new(format!("item-{ms}"), vec![], 1.0, ""))
        .collect();

    let enriched = service.enrich(&items).await;

    let names: Vec<&str> = enriched.iter().map(|e| e.name.as_str()).collect();
    let expected: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_empty_input_gives_empty_output() {
    let service = EnrichmentService::with_strategies(vec![], 1);
    assert!(service.enrich(&[]).await.is_empty());
}

#[tokio::test]
async fn test_analyze_sums_scaled_portions_and_grades() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let dataset = write_dataset(dir.path(), &[])?;
    let failing = Arc::new(FailingSearch {
        calls: AtomicUsize::new(0),
    });
    let service = chain(&dataset, failing);
    let items = vec![
        CandidateItem::new("rice", vec![], 150.0, "g"),
        CandidateItem::new("banana", vec![], 1.0, "unit"),
    ];

    let analysis = service.analyze(&items).await;

    // 130 kcal * 1.5 + 89 kcal * 1.0
    assert!((analysis.totals.calories - 284.0).abs() < 1e-9);
    assert_eq!(analysis.totals, sum_totals(&analysis.items));
    assert_eq!(analysis.totals.salt, None);
    // Only sugar (12.35 g) earns points
    assert_eq!(analysis.grade, Grade::A);
    Ok(())
}
