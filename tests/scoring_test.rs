// ABOUTME: Integration tests for meal grading and component levels
// ABOUTME: Exercises grade bands, serialized shapes, and monotonic behaviour per component
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use anyhow::Result;
use nutrition_enrichment::models::NutritionTotals;
use nutrition_enrichment::nutrition::scoring::{grade, levels, score_breakdown};
use nutrition_enrichment::nutrition::{Grade, Level};

fn meal(calories: f64, fat: f64, sugar: f64, salt: f64) -> NutritionTotals {
    NutritionTotals {
        calories,
        fat,
        sugar,
        salt: Some(salt),
        ..NutritionTotals::default()
    }
}

#[test]
fn test_light_meal_grades_a_with_low_levels() {
    let light = meal(250.0, 2.0, 3.0, 0.1);
    assert_eq!(grade(&light), Grade::A);

    let result = levels(&light);
    assert_eq!(result.fat, Level::Low);
    assert_eq!(result.saturated_fat, Level::Low);
    assert_eq!(result.sugar, Level::Low);
    assert_eq!(result.salt, Level::Low);
}

#[test]
fn test_breakdown_counts_bands_exceeded() {
    // 700 kcal: 2, 15 g fat -> 4.5 g sat: 4, 10 g sugar: 2, 0.5 g salt: 2
    let breakdown = score_breakdown(&meal(700.0, 15.0, 10.0, 0.5));
    assert_eq!(breakdown.energy, 2);
    assert_eq!(breakdown.saturated_fat, 4);
    assert_eq!(breakdown.sugar, 2);
    assert_eq!(breakdown.salt, 2);
    assert_eq!(breakdown.total, 10);
    assert_eq!(grade(&meal(700.0, 15.0, 10.0, 0.5)), Grade::B);
}

#[test]
fn test_each_component_is_monotonic() {
    let amounts = [0.0, 0.5, 2.0, 5.0, 12.0, 20.0, 40.0, 400.0, 900.0, 2500.0];
    let base = meal(300.0, 3.0, 4.0, 0.2);

    for amount in amounts {
        for larger in amounts.iter().copied().filter(|larger| *larger >= amount) {
            let grow = |set: fn(&mut NutritionTotals, f64)| {
                let mut small = base;
                let mut big = base;
                set(&mut small, amount);
                set(&mut big, larger);
                (grade(&small), grade(&big), levels(&small), levels(&big))
            };

            let (g1, g2, _, _) = grow(|t, v| t.calories = v);
            assert!(g1 <= g2, "calories {amount} -> {larger}");

            let (g1, g2, l1, l2) = grow(|t, v| t.fat = v);
            assert!(g1 <= g2, "fat {amount} -> {larger}");
            assert!(l1.fat <= l2.fat && l1.saturated_fat <= l2.saturated_fat);

            let (g1, g2, l1, l2) = grow(|t, v| t.sugar = v);
            assert!(g1 <= g2, "sugar {amount} -> {larger}");
            assert!(l1.sugar <= l2.sugar);

            let (g1, g2, l1, l2) = grow(|t, v| t.salt = Some(v / 100.0));
            assert!(g1 <= g2, "salt {amount} -> {larger}");
            assert!(l1.salt <= l2.salt);
        }
    }
}

#[test]
fn test_invalid_values_do_not_panic() {
    let odd = NutritionTotals {
        calories: f64::NAN,
        fat: -4.0,
        sugar: f64::INFINITY,
        salt: None,
        ..NutritionTotals::default()
    };
    assert_eq!(score_breakdown(&odd).energy, 0);
    assert_eq!(score_breakdown(&odd).sugar, 5);
    assert_eq!(levels(&odd).fat, Level::Low);
}

#[test]
fn test_serialized_shapes() -> Result<()> {
    let result = levels(&meal(0.0, 20.0, 10.0, 0.2));
    let json = serde_json::to_value(result)?;
    assert_eq!(json["fat"], "high");
    assert_eq!(json["saturatedFat"], "high");
    assert_eq!(json["sugar"], "medium");
    assert_eq!(json["salt"], "low");
    assert_eq!(serde_json::to_value(Grade::C)?, "C");
    Ok(())
}
