// ABOUTME: Bounded streaming search over the bulk nutrition dataset file
// ABOUTME: Lazily parses header-led delimited rows and keeps the best-scoring product match
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Dataset Search Engine
//!
//! The dataset is a multi-gigabyte export with one product per row. There is
//! no index: every search opens the file, reads the header once, and streams
//! rows through [`DatasetRows`] until the scan cap is reached. The file handle
//! belongs to the iterator and is released when the search returns, whether it
//! finished the file, stopped at the cap, or bailed out on an I/O error.
//!
//! Scoring per row, for each search term (original and canonical form):
//! - product name contains the term
//! - term contains the product name
//! - exact equality
//!
//! The best term score gets a completeness bonus for each of energy and
//! protein being present. Rows are ranked on that raw score, so the bonus
//! still separates two exact name matches; the first row reaching the highest
//! score wins. The reported match score is clamped to 1.

use crate::config::{DatasetConfig, MatchWeights};
use crate::errors::AppResult;
use crate::models::{DatasetRecord, Macros, MatchResult, MatchSource};
use crate::nutrition::normalizer::TermNormalizer;
use csv::{ErrorKind, ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Kilojoules per kilocalorie
const KJ_PER_KCAL: f64 = 4.184;

/// Column positions resolved from the header row
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    by_name: HashMap<String, usize>,
    width: usize,
}

impl ColumnIndex {
    /// Map header field names to their positions
    #[must_use]
    pub fn from_headers(headers: &StringRecord) -> Self {
        let by_name = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim_start_matches('\u{feff}').trim().to_owned(), idx))
            .collect();
        Self {
            by_name,
            width: headers.len(),
        }
    }

    /// Number of fields every data row must have
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Position of `column`, if the header has it
    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.by_name.get(column).copied()
    }

    fn text<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.position(column)
            .and_then(|idx| record.get(idx))
            .map_or("", str::trim)
    }

    fn number(&self, record: &StringRecord, column: &str) -> Option<f64> {
        self.text(record, column)
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }

    fn tags(&self, record: &StringRecord, column: &str) -> Vec<String> {
        self.text(record, column)
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Build a [`DatasetRecord`] from one well-formed row
    #[must_use]
    pub fn parse(&self, record: &StringRecord) -> DatasetRecord {
        // energy_100g is kJ in the export; prefer the kcal column when present
        let energy_kcal = self
            .number(record, "energy-kcal_100g")
            .or_else(|| self.number(record, "energy_100g").map(|kj| kj / KJ_PER_KCAL));
        let protein = self.number(record, "proteins_100g");

        let nutrition_grade = Some(self.text(record, "nutriscore_grade").to_uppercase())
            .filter(|grade| matches!(grade.as_str(), "A" | "B" | "C" | "D" | "E"));
        let nova_group = self
            .number(record, "nova_group")
            .filter(|group| (1.0..=4.0).contains(group))
            .map(|group| group as u8);

        DatasetRecord {
            product_name: self.text(record, "product_name").to_owned(),
            categories: self.text(record, "categories").to_owned(),
            brands: self.text(record, "brands").to_owned(),
            nutrients: Macros {
                calories: energy_kcal.unwrap_or(0.0),
                carbs: self.number(record, "carbohydrates_100g").unwrap_or(0.0),
                protein: protein.unwrap_or(0.0),
                fat: self.number(record, "fat_100g").unwrap_or(0.0),
                fiber: self.number(record, "fiber_100g").unwrap_or(0.0),
                sugar: self.number(record, "sugars_100g").unwrap_or(0.0),
                salt: self.number(record, "salt_100g"),
            },
            has_energy: energy_kcal.is_some_and(|kcal| kcal > 0.0),
            has_protein: protein.is_some_and(|grams| grams > 0.0),
            nutrition_grade,
            nova_group,
            ingredients_text: self.text(record, "ingredients_text").to_owned(),
            allergens: self.tags(record, "allergens_tags"),
            additives: self.tags(record, "additives_tags"),
        }
    }
}

/// Lazy, finite sequence of well-formed dataset rows
///
/// Owns the open file; dropping the iterator closes it. Opening the same path
/// again restarts the sequence from the first data row.
pub struct DatasetRows {
    reader: csv::Reader<File>,
    columns: ColumnIndex,
    limit: Option<usize>,
    rows_read: usize,
    rows_skipped: usize,
}

impl DatasetRows {
    /// Open `path` and parse its header row
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its header cannot be read
    pub fn open(path: &Path, delimiter: u8) -> AppResult<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            // Tab exports carry unbalanced quotes inside free text
            .quoting(delimiter != b'\t')
            .flexible(true)
            .has_headers(true)
            .from_path(path)?;
        let columns = ColumnIndex::from_headers(reader.headers()?);

        Ok(Self {
            reader,
            columns,
            limit: None,
            rows_read: 0,
            rows_skipped: 0,
        })
    }

    /// Stop after `max_rows` data rows (well-formed or not)
    #[must_use]
    pub fn with_limit(mut self, max_rows: usize) -> Self {
        self.limit = Some(max_rows);
        self
    }

    /// Header column positions
    #[must_use]
    pub const fn columns(&self) -> &ColumnIndex {
        &self.columns
    }

    /// Data rows consumed so far, including skipped ones
    #[must_use]
    pub const fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Rows dropped for a field-count mismatch or undecodable content
    #[must_use]
    pub const fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }
}

impl Iterator for DatasetRows {
    type Item = DatasetRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        loop {
            if self.limit.is_some_and(|limit| self.rows_read >= limit) {
                return None;
            }
            match self.reader.read_record(&mut record) {
                Ok(false) => return None,
                Ok(true) => {
                    self.rows_read += 1;
                    if record.len() != self.columns.width() {
                        self.rows_skipped += 1;
                        continue;
                    }
                    return Some(self.columns.parse(&record));
                }
                Err(e) if matches!(e.kind(), ErrorKind::Io(_)) => {
                    warn!("Dataset read aborted after {} rows: {}", self.rows_read, e);
                    return None;
                }
                Err(e) => {
                    self.rows_read += 1;
                    self.rows_skipped += 1;
                    debug!("Skipping undecodable dataset row: {}", e);
                }
            }
        }
    }
}

/// Score one record against lowercase search terms
///
/// Returns 0 for records without a product name. The completeness bonus only
/// applies once at least one term matched the name. The result is unclamped
/// and can exceed 1 when an exact match carries both bonuses.
#[must_use]
pub fn score_record(record: &DatasetRecord, terms: &[String], weights: &MatchWeights) -> f64 {
    let name = record.product_name.to_lowercase();
    if name.is_empty() {
        return 0.0;
    }

    let text_score = terms
        .iter()
        .map(|term| {
            let mut score = 0.0;
            if name.contains(term.as_str()) {
                score += weights.name_contains_term;
            }
            if term.contains(name.as_str()) {
                score += weights.term_contains_name;
            }
            if name == *term {
                score += weights.exact_match;
            }
            score
        })
        .fold(0.0_f64, f64::max);

    if text_score <= 0.0 {
        return 0.0;
    }

    let mut score = text_score;
    if record.has_energy {
        score += weights.completeness_bonus;
    }
    if record.has_protein {
        score += weights.completeness_bonus;
    }
    score
}

/// Streaming best-match search over the dataset file
#[derive(Debug, Clone)]
pub struct DatasetSearchEngine {
    config: DatasetConfig,
    normalizer: &'static TermNormalizer,
}

impl DatasetSearchEngine {
    /// Create an engine over the configured dataset, using the shared normalizer
    #[must_use]
    pub fn new(config: DatasetConfig) -> Self {
        Self {
            config,
            normalizer: TermNormalizer::shared(),
        }
    }

    /// Lowercase terms plus their canonical forms, deduplicated in order
    #[must_use]
    pub fn expand_terms<S: AsRef<str>>(&self, terms: &[S]) -> Vec<String> {
        let mut expanded: Vec<String> = Vec::with_capacity(terms.len() * 2);
        for term in terms {
            let original = term.as_ref().trim().to_lowercase();
            if original.is_empty() {
                continue;
            }
            let canonical = self.normalizer.normalize(&original).trim().to_lowercase();
            for candidate in [original, canonical] {
                if !candidate.is_empty() && !expanded.contains(&candidate) {
                    expanded.push(candidate);
                }
            }
        }
        expanded
    }

    /// Best dataset match for `terms`, scanning on the blocking thread pool
    pub async fn search(&self, terms: &[String]) -> Option<MatchResult> {
        let engine = self.clone();
        let terms = terms.to_vec();
        match tokio::task::spawn_blocking(move || engine.search_blocking(&terms)).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Dataset search task failed: {}", e);
                None
            }
        }
    }

    /// Best dataset match for `terms`
    ///
    /// A missing or unreadable dataset yields `None`, as does a best score not
    /// strictly above the threshold.
    pub fn search_blocking<S: AsRef<str>>(&self, terms: &[S]) -> Option<MatchResult> {
        let terms = self.expand_terms(terms);
        if terms.is_empty() {
            return None;
        }

        let mut rows = match DatasetRows::open(&self.config.path, self.config.delimiter) {
            Ok(rows) => rows.with_limit(self.config.max_scan_rows),
            Err(e) => {
                warn!(
                    path = %self.config.path.display(),
                    "Dataset unavailable, skipping dataset tier: {}", e
                );
                return None;
            }
        };

        let weights = self.config.weights;
        let mut best: Option<(f64, DatasetRecord)> = None;
        for record in rows.by_ref() {
            let score = score_record(&record, &terms, &weights);
            let improves = match &best {
                Some((top, _)) => score > *top,
                None => true,
            };
            if improves {
                best = Some((score, record));
            }
        }

        debug!(
            terms = ?terms,
            rows_scanned = rows.rows_read(),
            rows_skipped = rows.rows_skipped(),
            best_score = best.as_ref().map(|(score, _)| *score),
            "Dataset scan finished"
        );

        best.filter(|(score, _)| *score > weights.threshold)
            .map(|(score, record)| MatchResult {
                record,
                score: score.min(1.0),
                source: MatchSource::Dataset,
            })
    }
}
