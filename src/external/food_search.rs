// ABOUTME: External food search contract used as the second tier of the fallback chain
// ABOUTME: USDA-backed implementation plus a disabled no-op implementation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! External food search
//!
//! Implementations return `Ok(None)` for "nothing found" and `Err` for
//! transport or parse failures. The orchestrator treats both the same way and
//! moves on to the next tier; neither reaches the enrichment caller.

use crate::config::ExternalSearchConfig;
use crate::constants::usda;
use crate::errors::AppResult;
use crate::external::usda_client::{FoodNutrient, UsdaClient};
use crate::models::Macros;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Sodium to salt mass ratio
const SALT_PER_SODIUM: f64 = 2.5;

/// Per-100 g values an external source reported; absent components are `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialMacros {
    /// Name the source matched
    pub description: String,
    /// Energy in kcal
    pub calories: Option<f64>,
    /// Carbohydrates in grams
    pub carbs: Option<f64>,
    /// Protein in grams
    pub protein: Option<f64>,
    /// Fat in grams
    pub fat: Option<f64>,
    /// Fiber in grams
    pub fiber: Option<f64>,
    /// Sugar in grams
    pub sugar: Option<f64>,
    /// Salt in grams
    pub salt: Option<f64>,
}

impl PartialMacros {
    /// Collect the nutrients we track from a USDA nutrient list
    #[must_use]
    pub fn from_usda(description: impl Into<String>, nutrients: &[FoodNutrient]) -> Self {
        let amount = |id: u32| {
            nutrients
                .iter()
                .find(|n| n.nutrient_id == id)
                .map(|n| n.amount)
                .filter(|value| value.is_finite() && *value >= 0.0)
        };
        Self {
            description: description.into(),
            calories: amount(usda::NUTRIENT_ENERGY_KCAL),
            carbs: amount(usda::NUTRIENT_CARBS),
            protein: amount(usda::NUTRIENT_PROTEIN),
            fat: amount(usda::NUTRIENT_FAT),
            fiber: amount(usda::NUTRIENT_FIBER),
            sugar: amount(usda::NUTRIENT_SUGARS),
            salt: amount(usda::NUTRIENT_SODIUM_MG).map(|mg| mg * SALT_PER_SODIUM / 1000.0),
        }
    }

    /// Usable only when energy is known
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.calories.is_some_and(|kcal| kcal > 0.0)
    }

    /// Fill missing components with zero
    #[must_use]
    pub fn to_macros(&self) -> Macros {
        Macros {
            calories: self.calories.unwrap_or(0.0),
            carbs: self.carbs.unwrap_or(0.0),
            protein: self.protein.unwrap_or(0.0),
            fat: self.fat.unwrap_or(0.0),
            fiber: self.fiber.unwrap_or(0.0),
            sugar: self.sugar.unwrap_or(0.0),
            salt: self.salt,
        }
    }
}

/// Best-effort outside lookup for one query
#[async_trait]
pub trait ExternalFoodSearch: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Look up `query`, returning per-100 g values when something usable was found
    ///
    /// # Errors
    ///
    /// Returns an error on network, status, or parse failures
    async fn lookup(&self, query: &str) -> AppResult<Option<PartialMacros>>;
}

/// External search that never finds anything; used when no source is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFoodSearch;

#[async_trait]
impl ExternalFoodSearch for NoopFoodSearch {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn lookup(&self, _query: &str) -> AppResult<Option<PartialMacros>> {
        Ok(None)
    }
}

/// External search backed by USDA `FoodData` Central
pub struct UsdaFoodSearch {
    client: UsdaClient,
}

impl UsdaFoodSearch {
    /// Wrap an existing client
    #[must_use]
    pub const fn new(client: UsdaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExternalFoodSearch for UsdaFoodSearch {
    fn name(&self) -> &'static str {
        "usda"
    }

    async fn lookup(&self, query: &str) -> AppResult<Option<PartialMacros>> {
        let Some(hit) = self.client.search_foods(query, 1).await?.into_iter().next() else {
            debug!(query, "USDA search returned no foods");
            return Ok(None);
        };

        let inline = PartialMacros::from_usda(&hit.description, &hit.food_nutrients);
        if inline.is_usable() {
            return Ok(Some(inline));
        }

        let details = self.client.get_food_details(hit.fdc_id).await?;
        let detailed = PartialMacros::from_usda(details.description, &details.food_nutrients);
        Ok(Some(detailed).filter(PartialMacros::is_usable))
    }
}

/// External search for the configuration: USDA when a key is set, otherwise no-op
#[must_use]
pub fn from_config(config: &ExternalSearchConfig) -> Arc<dyn ExternalFoodSearch> {
    if config.api_key.is_none() {
        return Arc::new(NoopFoodSearch);
    }
    match UsdaClient::new(config) {
        Ok(client) => Arc::new(UsdaFoodSearch::new(client)),
        Err(e) => {
            tracing::warn!("External food search disabled: {}", e);
            Arc::new(NoopFoodSearch)
        }
    }
}
