// ABOUTME: External lookup sources used when the bulk dataset has no confident match
// ABOUTME: USDA FoodData Central client and the soft-failing search contract around it
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! External API Clients

/// External search contract and implementations
pub mod food_search;
/// USDA `FoodData` Central client
pub mod usda_client;

pub use food_search::{ExternalFoodSearch, NoopFoodSearch, PartialMacros, UsdaFoodSearch};
pub use usda_client::{FoodDetails, FoodNutrient, FoodSearchResult, UsdaClient};
