// ABOUTME: Crate-wide constants: environment variable names, defaults, and fixed tier values
// ABOUTME: Search weights live here as defaults so configuration can override them
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Constants Module
//!
//! Hardcoded defaults and the names of the environment variables that override them.

/// Service identity used in structured logs
pub mod service_names {
    /// Default service name reported at startup
    pub const NUTRITION_ENRICHMENT: &str = "nutrition-enrichment";
}

/// Environment variable names read by [`crate::config::EnrichmentConfig::from_env`]
pub mod env_vars {
    /// Path of the live dataset file
    pub const DATASET_PATH: &str = "NUTRITION_DATASET_PATH";
    /// Single-byte field delimiter (`,` or `\t`)
    pub const DATASET_DELIMITER: &str = "NUTRITION_DATASET_DELIMITER";
    /// Maximum number of data rows scanned per search
    pub const DATASET_MAX_SCAN_ROWS: &str = "NUTRITION_DATASET_MAX_SCAN_ROWS";
    /// URL of the compressed dataset export
    pub const DATASET_SOURCE_URL: &str = "NUTRITION_DATASET_URL";
    /// Codec of the export (`gzip`, `zstd`, `none`); inferred from the URL when unset
    pub const DATASET_CODEC: &str = "NUTRITION_DATASET_CODEC";
    /// Download timeout in seconds
    pub const DOWNLOAD_TIMEOUT_SECS: &str = "NUTRITION_DOWNLOAD_TIMEOUT_SECS";
    /// Scheduled refresh interval in hours
    pub const REFRESH_INTERVAL_HOURS: &str = "NUTRITION_REFRESH_INTERVAL_HOURS";
    /// Enable the periodic refresh scheduler
    pub const REFRESH_SCHEDULE_ENABLED: &str = "NUTRITION_REFRESH_SCHEDULE_ENABLED";
    /// USDA `FoodData` Central API key; external search is disabled when unset
    pub const USDA_API_KEY: &str = "USDA_API_KEY";
    /// USDA API base URL
    pub const USDA_BASE_URL: &str = "USDA_BASE_URL";
    /// Per-call timeout for the external search tier
    pub const EXTERNAL_SEARCH_TIMEOUT_SECS: &str = "NUTRITION_EXTERNAL_TIMEOUT_SECS";
    /// Maximum number of items enriched concurrently
    pub const MAX_CONCURRENT_ITEMS: &str = "NUTRITION_MAX_CONCURRENT_ITEMS";
    /// Match weight overrides
    pub const WEIGHT_NAME_CONTAINS_TERM: &str = "NUTRITION_WEIGHT_NAME_CONTAINS_TERM";
    /// Match weight overrides
    pub const WEIGHT_TERM_CONTAINS_NAME: &str = "NUTRITION_WEIGHT_TERM_CONTAINS_NAME";
    /// Match weight overrides
    pub const WEIGHT_EXACT_MATCH: &str = "NUTRITION_WEIGHT_EXACT_MATCH";
    /// Match weight overrides
    pub const WEIGHT_COMPLETENESS_BONUS: &str = "NUTRITION_WEIGHT_COMPLETENESS_BONUS";
    /// Minimum score for a dataset row to count as a match
    pub const MATCH_THRESHOLD: &str = "NUTRITION_MATCH_THRESHOLD";
}

/// Dataset search defaults
pub mod search {
    /// Default live dataset location
    pub const DEFAULT_DATASET_PATH: &str = "data/openfoodfacts.csv";
    /// Upper bound on data rows read by one search
    pub const DEFAULT_MAX_SCAN_ROWS: usize = 50_000;
    /// Product name contains the term
    pub const WEIGHT_NAME_CONTAINS_TERM: f64 = 0.5;
    /// Term contains the product name
    pub const WEIGHT_TERM_CONTAINS_NAME: f64 = 0.3;
    /// Product name equals the term
    pub const WEIGHT_EXACT_MATCH: f64 = 0.2;
    /// Bonus for each of energy / protein present and positive
    pub const WEIGHT_COMPLETENESS_BONUS: f64 = 0.1;
    /// Rows must score strictly above this to be returned
    pub const MATCH_THRESHOLD: f64 = 0.3;
}

/// Dataset refresh defaults
pub mod refresh {
    /// Open Food Facts full CSV export
    pub const DEFAULT_SOURCE_URL: &str =
        "https://static.openfoodfacts.org/data/en.openfoodfacts.org.products.csv.gz";
    /// Large-file transfer budget
    pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 3 * 60 * 60;
    /// Weekly refresh
    pub const DEFAULT_INTERVAL_HOURS: u64 = 7 * 24;
    /// Progress published when a download starts
    pub const PROGRESS_DOWNLOAD_START: u8 = 10;
    /// Progress reached when the last byte arrives
    pub const PROGRESS_DOWNLOAD_END: u8 = 90;
    /// Progress step published when decompression starts
    pub const PROGRESS_DECOMPRESS: u8 = 85;
    /// Progress of a completed run
    pub const PROGRESS_COMPLETE: u8 = 100;
    /// Suffix of the compressed download next to the live file
    pub const DOWNLOAD_SUFFIX: &str = "download";
    /// Suffix of the decompressed staging file next to the live file
    pub const STAGING_SUFFIX: &str = "partial";
}

/// Enrichment defaults and fixed per-tier confidence
pub mod enrichment {
    /// Default items resolved concurrently
    pub const DEFAULT_MAX_CONCURRENT_ITEMS: usize = 8;
    /// Default timeout for one external search call
    pub const DEFAULT_EXTERNAL_TIMEOUT_SECS: u64 = 8;
    /// Confidence attached to external search hits
    pub const EXTERNAL_MATCH_SCORE: f64 = 0.8;
    /// Confidence attached to static table hits
    pub const STATIC_MATCH_SCORE: f64 = 0.6;
    /// Confidence attached to the generic default
    pub const DEFAULT_MATCH_SCORE: f64 = 0.35;
    /// Grams in one reference portion (dataset values are per 100 g)
    pub const REFERENCE_PORTION_GRAMS: f64 = 100.0;
}

/// USDA `FoodData` Central defaults
pub mod usda {
    /// Public API base URL
    pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
    /// Cached search/details lifetime
    pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;
    /// Requests allowed per rolling minute
    pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 30;
    /// Nutrient ids used when mapping details onto macros
    pub const NUTRIENT_PROTEIN: u32 = 1003;
    /// Total lipid (fat)
    pub const NUTRIENT_FAT: u32 = 1004;
    /// Carbohydrate, by difference
    pub const NUTRIENT_CARBS: u32 = 1005;
    /// Energy (kcal)
    pub const NUTRIENT_ENERGY_KCAL: u32 = 1008;
    /// Fiber, total dietary
    pub const NUTRIENT_FIBER: u32 = 1079;
    /// Sodium (mg)
    pub const NUTRIENT_SODIUM_MG: u32 = 1093;
    /// Sugars, total
    pub const NUTRIENT_SUGARS: u32 = 2000;
}
