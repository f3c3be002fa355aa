// ABOUTME: USDA FoodData Central API client used by the external search tier
// ABOUTME: Implements food search and detail retrieval with TTL caching and rate limiting
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! USDA `FoodData` Central API Client
//!
//! - `foods/search` returns candidate foods, usually with inline nutrients
//! - `food/{fdcId}` returns the full nutrient list for one food
//! - responses are cached for the configured TTL
//! - requests are throttled to a per-minute budget
//!
//! # API Reference
//! USDA `FoodData` Central API: <https://fdc.nal.usda.gov/api-guide.html>

use crate::config::ExternalSearchConfig;
use crate::errors::{AppError, AppResult, ErrorCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// One nutrient amount, per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodNutrient {
    /// Nutrient ID (1008 = energy kcal, 1003 = protein, ...)
    pub nutrient_id: u32,
    /// Nutrient name
    pub nutrient_name: String,
    /// Unit (g, mg, kcal)
    pub unit_name: String,
    /// Amount per 100 g
    pub amount: f64,
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSearchResult {
    /// `FoodData` Central ID
    pub fdc_id: u64,
    /// Food description
    pub description: String,
    /// Data type (Foundation, SR Legacy, Branded, ...)
    pub data_type: String,
    /// Brand owner for branded foods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_owner: Option<String>,
    /// Nutrients returned inline with the hit
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

/// Full nutrient listing for one food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodDetails {
    /// `FoodData` Central ID
    pub fdc_id: u64,
    /// Food description
    pub description: String,
    /// Data type
    pub data_type: String,
    /// Nutrients with amounts
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFood {
    fdc_id: u64,
    description: String,
    #[serde(default)]
    data_type: String,
    brand_owner: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<SearchNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNutrient {
    nutrient_id: Option<u32>,
    #[serde(default)]
    nutrient_name: String,
    #[serde(default)]
    unit_name: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodDetailsResponse {
    fdc_id: u64,
    description: String,
    #[serde(default)]
    data_type: String,
    #[serde(default)]
    food_nutrients: Vec<DetailNutrient>,
}

#[derive(Debug, Deserialize)]
struct DetailNutrient {
    nutrient: Option<NutrientInfo>,
    amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NutrientInfo {
    id: u32,
    name: String,
    #[serde(default)]
    unit_name: String,
}

impl From<SearchFood> for FoodSearchResult {
    fn from(food: SearchFood) -> Self {
        Self {
            fdc_id: food.fdc_id,
            description: food.description,
            data_type: food.data_type,
            brand_owner: food.brand_owner,
            food_nutrients: food
                .food_nutrients
                .into_iter()
                .filter_map(|n| {
                    Some(FoodNutrient {
                        nutrient_id: n.nutrient_id?,
                        nutrient_name: n.nutrient_name,
                        unit_name: n.unit_name,
                        amount: n.value?,
                    })
                })
                .collect(),
        }
    }
}

impl From<FoodDetailsResponse> for FoodDetails {
    fn from(details: FoodDetailsResponse) -> Self {
        Self {
            fdc_id: details.fdc_id,
            description: details.description,
            data_type: details.data_type,
            food_nutrients: details
                .food_nutrients
                .into_iter()
                .filter_map(|n| {
                    let nutrient = n.nutrient?;
                    Some(FoodNutrient {
                        nutrient_id: nutrient.id,
                        nutrient_name: nutrient.name,
                        unit_name: nutrient.unit_name,
                        amount: n.amount.unwrap_or(0.0),
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

/// Drop expired entries, then store `data` under `key`
fn insert_fresh<K, T>(cache: &mut HashMap<K, CacheEntry<T>>, key: K, data: T, ttl: Duration)
where
    K: Eq + std::hash::Hash,
{
    let now = Instant::now();
    cache.retain(|_, entry| now < entry.expires_at);
    cache.insert(
        key,
        CacheEntry {
            data,
            expires_at: now + ttl,
        },
    );
}

/// Sliding-window request limiter
#[derive(Debug)]
struct RateLimiter {
    requests: Vec<Instant>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    const fn new(limit: u32, window: Duration) -> Self {
        Self {
            requests: Vec::new(),
            limit,
            window,
        }
    }

    fn can_request(&mut self) -> bool {
        let now = Instant::now();
        self.requests.retain(|&t| now.duration_since(t) < self.window);
        self.requests.len() < self.limit.max(1) as usize
    }

    async fn acquire(&mut self) {
        while !self.can_request() {
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        self.requests.push(Instant::now());
    }
}

/// USDA `FoodData` Central API client
pub struct UsdaClient {
    api_key: String,
    base_url: String,
    cache_ttl: Duration,
    http_client: reqwest::Client,
    search_cache: Arc<RwLock<HashMap<String, CacheEntry<Vec<FoodSearchResult>>>>>,
    details_cache: Arc<RwLock<HashMap<u64, CacheEntry<FoodDetails>>>>,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl UsdaClient {
    /// Create a client from the external search configuration
    ///
    /// # Errors
    ///
    /// Returns a config error when no API key is configured or the HTTP client cannot be built
    pub fn new(config: &ExternalSearchConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::config("USDA API key is not configured"))?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build USDA HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            cache_ttl: config.cache_ttl,
            http_client,
            search_cache: Arc::new(RwLock::new(HashMap::new())),
            details_cache: Arc::new(RwLock::new(HashMap::new())),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(
                config.rate_limit_per_minute,
                Duration::from_secs(60),
            ))),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        self.rate_limiter.lock().await.acquire().await;

        let response = self
            .http_client
            .get(url)
            .query(query)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::external_unavailable("USDA API", e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::new(
                ErrorCode::ExternalRateLimited,
                "USDA API rate limit exceeded",
            ));
        }
        if !status.is_success() {
            return Err(AppError::external_service(
                "USDA API",
                format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::external_service("USDA API", format!("JSON parse error: {e}")))
    }

    /// Search foods by free text
    ///
    /// # Errors
    ///
    /// Returns an error for an empty query, a page size outside 1-200, or a failed request
    pub async fn search_foods(
        &self,
        query: &str,
        page_size: u32,
    ) -> AppResult<Vec<FoodSearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid_input("Search query cannot be empty"));
        }
        if page_size == 0 || page_size > 200 {
            return Err(AppError::invalid_input(
                "Page size must be between 1 and 200",
            ));
        }

        let cache_key = format!("{}:{page_size}", query.to_lowercase());
        {
            let cache = self.search_cache.read().await;
            if let Some(entry) = cache.get(&cache_key) {
                if Instant::now() < entry.expires_at {
                    return Ok(entry.data.clone());
                }
            }
        }

        let url = format!("{}/foods/search", self.base_url);
        let page_size = page_size.to_string();
        let response: SearchResponse = self
            .get_json(&url, &[("query", query), ("pageSize", page_size.as_str())])
            .await?;
        let foods: Vec<FoodSearchResult> =
            response.foods.into_iter().map(FoodSearchResult::from).collect();

        insert_fresh(
            &mut *self.search_cache.write().await,
            cache_key,
            foods.clone(),
            self.cache_ttl,
        );

        Ok(foods)
    }

    /// Full nutrient listing for one food
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the food does not exist
    pub async fn get_food_details(&self, fdc_id: u64) -> AppResult<FoodDetails> {
        {
            let cache = self.details_cache.read().await;
            if let Some(entry) = cache.get(&fdc_id) {
                if Instant::now() < entry.expires_at {
                    return Ok(entry.data.clone());
                }
            }
        }

        let url = format!("{}/food/{fdc_id}", self.base_url);
        let response: FoodDetailsResponse = self.get_json(&url, &[]).await?;
        let details = FoodDetails::from(response);

        insert_fresh(
            &mut *self.details_cache.write().await,
            fdc_id,
            details.clone(),
            self.cache_ttl,
        );

        Ok(details)
    }

    /// Cached entry counts: (searches, details)
    pub async fn cache_stats(&self) -> (usize, usize) {
        let search_count = self.search_cache.read().await.len();
        let details_count = self.details_cache.read().await.len();
        (search_count, details_count)
    }
}
