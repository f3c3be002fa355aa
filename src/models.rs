// ABOUTME: Core data models for nutrition enrichment: candidate items, dataset records, matches
// ABOUTME: Defines macro-nutrient values, enriched items, and aggregated meal totals
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Data Models
//!
//! Candidate items arrive from the upstream extraction step, get resolved to a
//! [`MatchResult`] by one tier of the fallback chain, and leave as
//! [`EnrichedItem`]s whose macros are summed into [`NutritionTotals`].
//!
//! Dataset, external, and static-table values are all per 100 g; an
//! [`EnrichedItem`] carries both the per-100 g values and the portion-scaled ones.

use crate::constants::enrichment::REFERENCE_PORTION_GRAMS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A loosely specified food item produced by upstream extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
    /// Free-text food name
    pub name: String,
    /// Ordered candidate search terms, most specific first
    #[serde(default)]
    pub search_terms: Vec<String>,
    /// Amount eaten, in `unit`
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    /// Unit of `quantity` (g, ml, piece, serving, ...)
    #[serde(default)]
    pub unit: String,
}

const fn default_quantity() -> f64 {
    1.0
}

impl CandidateItem {
    /// Create a candidate item
    pub fn new(
        name: impl Into<String>,
        search_terms: Vec<String>,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            search_terms,
            quantity,
            unit: unit.into(),
        }
    }

    /// Non-empty search terms in order; the name when no term is usable
    #[must_use]
    pub fn effective_terms(&self) -> Vec<&str> {
        let terms: Vec<&str> = self
            .search_terms
            .iter()
            .map(|term| term.trim())
            .filter(|term| !term.is_empty())
            .collect();
        if terms.is_empty() {
            vec![self.name.trim()]
        } else {
            terms
        }
    }

    /// The term handed to single-shot tiers (external search)
    #[must_use]
    pub fn primary_term(&self) -> &str {
        self.effective_terms().first().copied().unwrap_or("")
    }

    /// Multiplier applied to per-100 g values for this item's portion
    ///
    /// Mass and volume units convert to grams (volume at density 1); count-like
    /// or unknown units treat one unit as one 100 g reference portion.
    #[must_use]
    pub fn portion_factor(&self) -> f64 {
        let quantity = if self.quantity.is_finite() && self.quantity > 0.0 {
            self.quantity
        } else {
            1.0
        };
        let grams_per_unit = match self.unit.trim().to_lowercase().as_str() {
            "g" | "gr" | "gram" | "grams" | "grama" | "gramas" | "gramos" | "ml" | "milliliter"
            | "milliliters" | "mililitro" | "mililitros" => Some(1.0),
            "kg" | "kilogram" | "kilograms" | "quilo" | "quilos" | "l" | "liter" | "liters"
            | "litro" | "litros" => Some(1000.0),
            "mg" => Some(0.001),
            "oz" | "ounce" | "ounces" => Some(28.349_5),
            "lb" | "lbs" | "pound" | "pounds" => Some(453.592),
            "cup" | "cups" | "xicara" | "xícara" | "taza" => Some(240.0),
            "tbsp" | "tablespoon" | "tablespoons" | "colher de sopa" => Some(15.0),
            "tsp" | "teaspoon" | "teaspoons" | "colher de chá" => Some(5.0),
            _ => None,
        };
        grams_per_unit.map_or(quantity, |grams| {
            quantity * grams / REFERENCE_PORTION_GRAMS
        })
    }
}

/// Macro-nutrient values; per 100 g unless stated otherwise
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    /// Energy in kcal
    pub calories: f64,
    /// Carbohydrates in grams
    pub carbs: f64,
    /// Protein in grams
    pub protein: f64,
    /// Fat in grams
    pub fat: f64,
    /// Fiber in grams
    pub fiber: f64,
    /// Sugar in grams
    pub sugar: f64,
    /// Salt in grams, when the source reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<f64>,
}

impl Macros {
    /// Multiply every component by `factor`
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            carbs: self.carbs * factor,
            protein: self.protein * factor,
            fat: self.fat * factor,
            fiber: self.fiber * factor,
            sugar: self.sugar * factor,
            salt: self.salt.map(|salt| salt * factor),
        }
    }
}

/// One row of the bulk nutrition dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Product name as listed
    pub product_name: String,
    /// Comma-separated category list
    pub categories: String,
    /// Comma-separated brand list
    pub brands: String,
    /// Per-100 g macros
    pub nutrients: Macros,
    /// Whether `energy_100g` was present and positive
    pub has_energy: bool,
    /// Whether `proteins_100g` was present and positive
    pub has_protein: bool,
    /// Nutrition grade letter (`a`..`e`) when graded
    pub nutrition_grade: Option<String>,
    /// Processing-level classifier (NOVA group 1-4)
    pub nova_group: Option<u8>,
    /// Ingredient list text
    pub ingredients_text: String,
    /// Allergen tags (`en:milk`, ...)
    pub allergens: Vec<String>,
    /// Additive tags (`en:e330`, ...)
    pub additives: Vec<String>,
}

/// Tier of the fallback chain that resolved an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    /// Bulk dataset search
    Dataset,
    /// External search adapter
    Internet,
    /// Curated static table
    Fallback,
    /// Generic default values
    Default,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Dataset => "dataset",
            Self::Internet => "internet",
            Self::Fallback => "fallback",
            Self::Default => "default",
        };
        f.write_str(tag)
    }
}

/// A resolved record with its confidence and tier
///
/// Absence of a match is `Option::None`; a constructed match from the dataset
/// tier always scores above the configured threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Matched (or synthesized) record
    pub record: DatasetRecord,
    /// Confidence in [0, 1]
    pub score: f64,
    /// Tier that produced the match
    pub source: MatchSource,
}

/// A candidate item with resolved nutrition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedItem {
    /// Free-text food name
    pub name: String,
    /// Search terms as supplied
    pub search_terms: Vec<String>,
    /// Amount eaten
    pub quantity: f64,
    /// Unit of `quantity`
    pub unit: String,
    /// Macros for the eaten portion
    pub macros: Macros,
    /// Macros per 100 g of the matched food
    pub per_100g: Macros,
    /// Tier that resolved the item
    pub source: MatchSource,
    /// Confidence of the resolving tier
    pub match_score: f64,
    /// Name of the matched product, when different from the item name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
    /// Nutrition grade letter of the matched product
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition_grade: Option<String>,
    /// Processing-level classifier of the matched product
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nova_group: Option<u8>,
}

impl EnrichedItem {
    /// Combine a candidate with the match that resolved it
    #[must_use]
    pub fn from_match(item: &CandidateItem, matched: MatchResult) -> Self {
        let per_100g = matched.record.nutrients;
        let matched_name = Some(matched.record.product_name)
            .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(&item.name));
        Self {
            name: item.name.clone(),
            search_terms: item.search_terms.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            macros: per_100g.scaled(item.portion_factor()),
            per_100g,
            source: matched.source,
            match_score: matched.score,
            matched_name,
            nutrition_grade: matched.record.nutrition_grade,
            nova_group: matched.record.nova_group,
        }
    }
}

/// Summed nutrition across all items of a meal
///
/// Values accumulate unrounded; [`NutritionTotals::rounded`] is for display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    /// Energy in kcal
    pub calories: f64,
    /// Carbohydrates in grams
    pub carbs: f64,
    /// Protein in grams
    pub protein: f64,
    /// Fat in grams
    pub fat: f64,
    /// Fiber in grams
    pub fiber: f64,
    /// Sugar in grams
    pub sugar: f64,
    /// Salt in grams; `None` when no item reported salt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<f64>,
}

impl NutritionTotals {
    /// Accumulate one item's macros
    pub fn add(&mut self, macros: &Macros) {
        self.calories += macros.calories;
        self.carbs += macros.carbs;
        self.protein += macros.protein;
        self.fat += macros.fat;
        self.fiber += macros.fiber;
        self.sugar += macros.sugar;
        if let Some(salt) = macros.salt {
            self.salt = Some(self.salt.unwrap_or(0.0) + salt);
        }
    }

    /// Salt in grams, zero when unknown
    #[must_use]
    pub fn salt_or_zero(&self) -> f64 {
        self.salt.unwrap_or(0.0)
    }

    /// Copy rounded to one decimal place for display
    #[must_use]
    pub fn rounded(&self) -> Self {
        let round = |value: f64| (value * 10.0).round() / 10.0;
        Self {
            calories: round(self.calories),
            carbs: round(self.carbs),
            protein: round(self.protein),
            fat: round(self.fat),
            fiber: round(self.fiber),
            sugar: round(self.sugar),
            salt: self.salt.map(round),
        }
    }
}

impl<'a> FromIterator<&'a EnrichedItem> for NutritionTotals {
    fn from_iter<I: IntoIterator<Item = &'a EnrichedItem>>(iter: I) -> Self {
        let mut totals = Self::default();
        for item in iter {
            totals.add(&item.macros);
        }
        totals
    }
}
