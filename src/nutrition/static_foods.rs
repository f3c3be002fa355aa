// ABOUTME: Curated per-100g macro table for common foods used when searches come up empty
// ABOUTME: Matched by case-insensitive substring against the item name and its canonical form
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Static fallback table
//!
//! Values are per 100 g, taken from USDA SR Legacy reference entries and
//! rounded to one decimal. Entries are scanned in order, so compound names
//! ("chicken breast", "brown rice") come before the words they contain.

use crate::models::{DatasetRecord, Macros};

/// One curated food
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticFood {
    /// Lowercase key matched as a substring
    pub key: &'static str,
    /// Energy in kcal per 100 g
    pub calories: f64,
    /// Carbohydrates per 100 g
    pub carbs: f64,
    /// Protein per 100 g
    pub protein: f64,
    /// Fat per 100 g
    pub fat: f64,
    /// Fiber per 100 g
    pub fiber: f64,
    /// Sugar per 100 g
    pub sugar: f64,
    /// Nutrition grade letter
    pub grade: &'static str,
}

impl StaticFood {
    const fn new(
        key: &'static str,
        values: [f64; 6],
        grade: &'static str,
    ) -> Self {
        Self {
            key,
            calories: values[0],
            carbs: values[1],
            protein: values[2],
            fat: values[3],
            fiber: values[4],
            sugar: values[5],
            grade,
        }
    }

    /// Per-100 g macros
    #[must_use]
    pub const fn macros(&self) -> Macros {
        Macros {
            calories: self.calories,
            carbs: self.carbs,
            protein: self.protein,
            fat: self.fat,
            fiber: self.fiber,
            sugar: self.sugar,
            salt: None,
        }
    }

    /// Synthesized record carrying this entry's values
    #[must_use]
    pub fn to_record(&self) -> DatasetRecord {
        DatasetRecord {
            product_name: self.key.to_owned(),
            nutrients: self.macros(),
            has_energy: self.calories > 0.0,
            has_protein: self.protein > 0.0,
            nutrition_grade: Some(self.grade.to_owned()),
            ..DatasetRecord::default()
        }
    }
}

//                                  kcal   carbs  prot  fat   fiber sugar
const FOODS: &[StaticFood] = &[
    StaticFood::new("chicken breast", [165.0, 0.0, 31.0, 3.6, 0.0, 0.0], "A"),
    StaticFood::new("brown rice", [123.0, 25.6, 2.7, 1.0, 1.6, 0.2], "A"),
    StaticFood::new("sweet potato", [86.0, 20.1, 1.6, 0.1, 3.0, 4.2], "A"),
    StaticFood::new("french fries", [312.0, 41.0, 3.4, 15.0, 3.8, 0.3], "C"),
    StaticFood::new("ground beef", [254.0, 0.0, 17.2, 20.0, 0.0, 0.0], "D"),
    StaticFood::new("chicken", [239.0, 0.0, 27.3, 13.6, 0.0, 0.0], "B"),
    StaticFood::new("rice", [130.0, 28.2, 2.7, 0.3, 0.4, 0.1], "A"),
    StaticFood::new("beans", [127.0, 22.8, 8.7, 0.5, 6.4, 0.3], "A"),
    StaticFood::new("lentils", [116.0, 20.1, 9.0, 0.4, 7.9, 1.8], "A"),
    StaticFood::new("pasta", [158.0, 30.9, 5.8, 0.9, 1.8, 0.6], "A"),
    StaticFood::new("bread", [265.0, 49.0, 9.0, 3.2, 2.7, 5.0], "B"),
    StaticFood::new("potato", [87.0, 20.1, 1.9, 0.1, 1.8, 0.9], "A"),
    StaticFood::new("egg", [155.0, 1.1, 12.6, 10.6, 0.0, 1.1], "A"),
    StaticFood::new("salmon", [208.0, 0.0, 20.4, 13.4, 0.0, 0.0], "B"),
    StaticFood::new("tuna", [132.0, 0.0, 28.2, 1.3, 0.0, 0.0], "A"),
    StaticFood::new("fish", [128.0, 0.0, 26.2, 2.7, 0.0, 0.0], "A"),
    StaticFood::new("pork", [242.0, 0.0, 27.3, 13.9, 0.0, 0.0], "C"),
    StaticFood::new("beef", [250.0, 0.0, 26.0, 15.0, 0.0, 0.0], "C"),
    StaticFood::new("cheese", [402.0, 1.3, 25.0, 33.0, 0.0, 0.5], "D"),
    StaticFood::new("milk", [61.0, 4.8, 3.2, 3.3, 0.0, 5.1], "B"),
    StaticFood::new("yogurt", [61.0, 4.7, 3.5, 3.3, 0.0, 4.7], "A"),
    StaticFood::new("banana", [89.0, 22.8, 1.1, 0.3, 2.6, 12.2], "A"),
    StaticFood::new("apple", [52.0, 13.8, 0.3, 0.2, 2.4, 10.4], "A"),
    StaticFood::new("orange", [47.0, 11.8, 0.9, 0.1, 2.4, 9.4], "A"),
    StaticFood::new("salad", [17.0, 3.3, 1.2, 0.2, 2.1, 1.2], "A"),
    StaticFood::new("pizza", [266.0, 33.0, 11.0, 10.0, 2.3, 3.6], "C"),
    StaticFood::new("oats", [389.0, 66.3, 16.9, 6.9, 10.6, 0.0], "A"),
    StaticFood::new("avocado", [160.0, 8.5, 2.0, 14.7, 6.7, 0.7], "A"),
    StaticFood::new("coffee", [2.0, 0.0, 0.3, 0.0, 0.0, 0.0], "B"),
];

/// All curated entries in match order
#[must_use]
pub fn entries() -> &'static [StaticFood] {
    FOODS
}

/// First curated entry whose key occurs in any of `names`
///
/// Each name is lowercased before matching; names are tried in order.
#[must_use]
pub fn lookup<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'static StaticFood> {
    names.into_iter().find_map(|name| {
        let haystack = name.trim().to_lowercase();
        if haystack.is_empty() {
            return None;
        }
        FOODS.iter().find(|food| haystack.contains(food.key))
    })
}
