// ABOUTME: Banded nutrition grading (A-E) and traffic-light levels for meal totals
// ABOUTME: Pure functions over NutritionTotals with saturated fat estimated from total fat
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Nutrition Scorer
//!
//! Two independent views of the same totals:
//!
//! - [`grade`]: the four "negative" components (energy, saturated fat, sugar,
//!   salt) each earn 0-5 points from ascending bands; the 0-20 sum maps to a
//!   letter.
//! - [`levels`]: fat, saturated fat, sugar and salt are each classified
//!   low/medium/high using front-of-pack thresholds per 100 g.
//!
//! No saturated-fat measurement is carried through the pipeline, so it is
//! estimated as 30% of total fat. Missing salt counts as zero.
//!
//! # References
//!
//! - Santé publique France. Nutri-Score computation (2017), "negative points" bands.
//! - UK Department of Health / FSA (2016). Guide to creating a front of pack
//!   nutrition label for pre-packed products sold through retail outlets.

use crate::models::NutritionTotals;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of total fat assumed to be saturated
pub const SATURATED_FAT_RATIO: f64 = 0.3;

/// Energy (kcal) bands; points = number of bands exceeded
const ENERGY_BANDS: [f64; 5] = [335.0, 670.0, 1005.0, 1340.0, 1675.0];
/// Saturated fat (g) bands
const SATURATED_FAT_BANDS: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
/// Sugar (g) bands
const SUGAR_BANDS: [f64; 5] = [4.5, 9.0, 13.5, 18.0, 22.5];
/// Salt (g) bands
const SALT_BANDS: [f64; 5] = [0.225, 0.45, 0.675, 0.9, 1.125];

/// Upper bounds of the point sum for A, B, C and D
const GRADE_CUTS: [(u8, Grade); 4] = [
    (2, Grade::A),
    (10, Grade::B),
    (18, Grade::C),
    (26, Grade::D),
];

/// (low upper bound, high lower bound) per component
const FAT_LEVELS: (f64, f64) = (3.0, 17.5);
const SATURATED_FAT_LEVELS: (f64, f64) = (1.5, 5.0);
const SUGAR_LEVELS: (f64, f64) = (5.0, 22.5);
const SALT_LEVELS: (f64, f64) = (0.3, 1.5);

/// Letter grade, A best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// Best
    A,
    /// Good
    B,
    /// Average
    C,
    /// Poor
    D,
    /// Worst
    E,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        };
        f.write_str(letter)
    }
}

/// Traffic-light classification of one component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// At or below the low threshold
    Low,
    /// Between thresholds
    Medium,
    /// Above the high threshold
    High,
}

/// Per-component levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientLevels {
    /// Total fat
    pub fat: Level,
    /// Estimated saturated fat
    pub saturated_fat: Level,
    /// Sugar
    pub sugar: Level,
    /// Salt
    pub salt: Level,
}

/// Points awarded per component and their sum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Energy points (0-5)
    pub energy: u8,
    /// Saturated fat points (0-5)
    pub saturated_fat: u8,
    /// Sugar points (0-5)
    pub sugar: u8,
    /// Salt points (0-5)
    pub salt: u8,
    /// Sum of the four (0-20)
    pub total: u8,
}

/// Clamp negatives and NaN to zero so every input has a defined result
fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

fn band_points(value: f64, bands: &[f64; 5]) -> u8 {
    let value = non_negative(value);
    // At most five bands, so the count always fits
    bands.iter().filter(|&&bound| value > bound).count() as u8
}

fn classify(value: f64, (low, high): (f64, f64)) -> Level {
    let value = non_negative(value);
    if value <= low {
        Level::Low
    } else if value > high {
        Level::High
    } else {
        Level::Medium
    }
}

/// Estimated saturated fat for the totals
#[must_use]
pub fn estimated_saturated_fat(totals: &NutritionTotals) -> f64 {
    non_negative(totals.fat) * SATURATED_FAT_RATIO
}

/// Points per component for the totals
#[must_use]
pub fn score_breakdown(totals: &NutritionTotals) -> ScoreBreakdown {
    let energy = band_points(totals.calories, &ENERGY_BANDS);
    let saturated_fat = band_points(estimated_saturated_fat(totals), &SATURATED_FAT_BANDS);
    let sugar = band_points(totals.sugar, &SUGAR_BANDS);
    let salt = band_points(totals.salt_or_zero(), &SALT_BANDS);
    ScoreBreakdown {
        energy,
        saturated_fat,
        sugar,
        salt,
        total: energy + saturated_fat + sugar + salt,
    }
}

/// Letter grade for the totals
#[must_use]
pub fn grade(totals: &NutritionTotals) -> Grade {
    let total = score_breakdown(totals).total;
    GRADE_CUTS
        .iter()
        .find(|(cut, _)| total <= *cut)
        .map_or(Grade::E, |(_, letter)| *letter)
}

/// Traffic-light levels for the totals
#[must_use]
pub fn levels(totals: &NutritionTotals) -> NutrientLevels {
    NutrientLevels {
        fat: classify(totals.fat, FAT_LEVELS),
        saturated_fat: classify(estimated_saturated_fat(totals), SATURATED_FAT_LEVELS),
        sugar: classify(totals.sugar, SUGAR_LEVELS),
        salt: classify(totals.salt_or_zero(), SALT_LEVELS),
    }
}
