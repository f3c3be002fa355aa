// ABOUTME: Environment configuration for dataset location, refresh schedule, and matching weights
// ABOUTME: Handles environment variable parsing, defaults, validation, and the global instance
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Environment-based configuration

use crate::constants::{enrichment, env_vars, refresh, search, usda};
use crate::dataset::codec::DatasetCodec;
use crate::errors::{AppError, AppResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

static ENRICHMENT_CONFIG: OnceLock<EnrichmentConfig> = OnceLock::new();

/// Weights used to score a dataset row against a search term
///
/// The values were tuned by hand; they are configuration, not invariants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    /// Product name contains the term
    pub name_contains_term: f64,
    /// Term contains the product name
    pub term_contains_name: f64,
    /// Product name equals the term
    pub exact_match: f64,
    /// Bonus for each of energy / protein present and positive
    pub completeness_bonus: f64,
    /// Rows must score strictly above this to be returned
    pub threshold: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            name_contains_term: search::WEIGHT_NAME_CONTAINS_TERM,
            term_contains_name: search::WEIGHT_TERM_CONTAINS_NAME,
            exact_match: search::WEIGHT_EXACT_MATCH,
            completeness_bonus: search::WEIGHT_COMPLETENESS_BONUS,
            threshold: search::MATCH_THRESHOLD,
        }
    }
}

/// Where the dataset lives and how it is scanned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Live dataset file read by searches and replaced by refreshes
    pub path: PathBuf,
    /// Field delimiter byte
    pub delimiter: u8,
    /// Maximum data rows read per search
    pub max_scan_rows: usize,
    /// Row scoring weights
    pub weights: MatchWeights,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(search::DEFAULT_DATASET_PATH),
            delimiter: b',',
            max_scan_rows: search::DEFAULT_MAX_SCAN_ROWS,
            weights: MatchWeights::default(),
        }
    }
}

/// Dataset refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Compressed export to download
    pub source_url: String,
    /// Codec of the export
    pub codec: DatasetCodec,
    /// Whole-transfer timeout
    pub download_timeout: Duration,
    /// Interval between scheduled refreshes
    pub interval: Duration,
    /// Whether the scheduler should run at all
    pub schedule_enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            source_url: refresh::DEFAULT_SOURCE_URL.to_owned(),
            codec: DatasetCodec::from_url(refresh::DEFAULT_SOURCE_URL),
            download_timeout: Duration::from_secs(refresh::DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            interval: Duration::from_secs(refresh::DEFAULT_INTERVAL_HOURS * 3600),
            schedule_enabled: true,
        }
    }
}

/// External (USDA) search tier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSearchConfig {
    /// API key; `None` disables the tier
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Timeout applied to one lookup
    pub timeout: Duration,
    /// Cache lifetime for search and details responses
    pub cache_ttl: Duration,
    /// Requests allowed per rolling minute
    pub rate_limit_per_minute: u32,
}

impl Default for ExternalSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: usda::DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(enrichment::DEFAULT_EXTERNAL_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(usda::DEFAULT_CACHE_TTL_SECS),
            rate_limit_per_minute: usda::DEFAULT_RATE_LIMIT_PER_MINUTE,
        }
    }
}

/// Orchestrator limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnrichmentLimits {
    /// Items resolved concurrently
    pub max_concurrent_items: usize,
}

impl Default for EnrichmentLimits {
    fn default() -> Self {
        Self {
            max_concurrent_items: enrichment::DEFAULT_MAX_CONCURRENT_ITEMS,
        }
    }
}

/// Complete configuration for the enrichment core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Dataset location and scan settings
    pub dataset: DatasetConfig,
    /// Refresh pipeline settings
    pub refresh: RefreshConfig,
    /// External search tier settings
    pub external: ExternalSearchConfig,
    /// Orchestrator limits
    pub limits: EnrichmentLimits,
}

/// Read an environment variable, falling back to `default` when unset
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an optional environment variable, using `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "\\t" | "\t" | "tab" => Ok(b'\t'),
        other if other.len() == 1 => Ok(other.as_bytes()[0]),
        other => anyhow::bail!("Invalid {} value: {other}", env_vars::DATASET_DELIMITER),
    }
}

impl EnrichmentConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable cannot be parsed or the result fails validation
    pub fn from_env() -> Result<Self> {
        info!("Loading nutrition enrichment configuration from environment");

        let defaults = Self::default();

        let weights = MatchWeights {
            name_contains_term: parse_env(
                env_vars::WEIGHT_NAME_CONTAINS_TERM,
                defaults.dataset.weights.name_contains_term,
            )?,
            term_contains_name: parse_env(
                env_vars::WEIGHT_TERM_CONTAINS_NAME,
                defaults.dataset.weights.term_contains_name,
            )?,
            exact_match: parse_env(
                env_vars::WEIGHT_EXACT_MATCH,
                defaults.dataset.weights.exact_match,
            )?,
            completeness_bonus: parse_env(
                env_vars::WEIGHT_COMPLETENESS_BONUS,
                defaults.dataset.weights.completeness_bonus,
            )?,
            threshold: parse_env(env_vars::MATCH_THRESHOLD, defaults.dataset.weights.threshold)?,
        };

        let dataset = DatasetConfig {
            path: PathBuf::from(env_var_or(
                env_vars::DATASET_PATH,
                search::DEFAULT_DATASET_PATH,
            )),
            delimiter: parse_delimiter(&env_var_or(env_vars::DATASET_DELIMITER, ","))?,
            max_scan_rows: parse_env(
                env_vars::DATASET_MAX_SCAN_ROWS,
                search::DEFAULT_MAX_SCAN_ROWS,
            )?,
            weights,
        };

        let source_url = env_var_or(env_vars::DATASET_SOURCE_URL, refresh::DEFAULT_SOURCE_URL);
        let codec = match env::var(env_vars::DATASET_CODEC) {
            Ok(raw) => raw
                .parse::<DatasetCodec>()
                .with_context(|| format!("Invalid {} value", env_vars::DATASET_CODEC))?,
            Err(_) => DatasetCodec::from_url(&source_url),
        };

        let refresh = RefreshConfig {
            codec,
            download_timeout: Duration::from_secs(parse_env(
                env_vars::DOWNLOAD_TIMEOUT_SECS,
                refresh::DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            )?),
            interval: Duration::from_secs(
                parse_env::<u64>(
                    env_vars::REFRESH_INTERVAL_HOURS,
                    refresh::DEFAULT_INTERVAL_HOURS,
                )?
                .saturating_mul(3600),
            ),
            schedule_enabled: parse_env(env_vars::REFRESH_SCHEDULE_ENABLED, true)?,
            source_url,
        };

        let api_key = env::var(env_vars::USDA_API_KEY)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!("{} not set, external food search disabled", env_vars::USDA_API_KEY);
        }

        let external = ExternalSearchConfig {
            api_key,
            base_url: env_var_or(env_vars::USDA_BASE_URL, usda::DEFAULT_BASE_URL),
            timeout: Duration::from_secs(parse_env(
                env_vars::EXTERNAL_SEARCH_TIMEOUT_SECS,
                enrichment::DEFAULT_EXTERNAL_TIMEOUT_SECS,
            )?),
            ..defaults.external
        };

        let limits = EnrichmentLimits {
            max_concurrent_items: parse_env(
                env_vars::MAX_CONCURRENT_ITEMS,
                enrichment::DEFAULT_MAX_CONCURRENT_ITEMS,
            )?,
        };

        let config = Self {
            dataset,
            refresh,
            external,
            limits,
        };
        config.validate()?;

        info!(
            dataset.path = %config.dataset.path.display(),
            dataset.max_scan_rows = config.dataset.max_scan_rows,
            refresh.url = %config.refresh.source_url,
            refresh.codec = ?config.refresh.codec,
            external.enabled = config.external.api_key.is_some(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` describing the first offending value
    pub fn validate(&self) -> AppResult<()> {
        if self.dataset.max_scan_rows == 0 {
            return Err(AppError::config_invalid(
                "dataset.max_scan_rows must be greater than zero",
            ));
        }
        let threshold = self.dataset.weights.threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(AppError::config_invalid(format!(
                "match threshold must be in [0, 1), got {threshold}"
            )));
        }
        if self.limits.max_concurrent_items == 0 {
            return Err(AppError::config_invalid(
                "limits.max_concurrent_items must be greater than zero",
            ));
        }
        if self.external.timeout.is_zero() || self.refresh.download_timeout.is_zero() {
            return Err(AppError::config_invalid("timeouts must be non-zero"));
        }
        if self.refresh.interval.is_zero() {
            return Err(AppError::config_invalid(
                "refresh.interval must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Process-wide configuration, loaded from the environment on first use
    pub fn global() -> &'static Self {
        ENRICHMENT_CONFIG.get_or_init(|| {
            Self::from_env().unwrap_or_else(|e| {
                warn!("Failed to load enrichment config: {e:#}, using defaults");
                Self::default()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EnrichmentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_delimiter_variants() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(parse_delimiter(";;").is_err());
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut config = EnrichmentConfig::default();
        config.dataset.weights.threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
