// ABOUTME: Bilingual food term normalizer mapping Portuguese/Spanish terms to dataset English
// ABOUTME: Static lookup table built once and shared read-only for the process lifetime
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Term canonicalization
//!
//! Matching is case-insensitive and order-sensitive: entries are scanned in
//! declaration order, so multi-word keys precede the single words they contain.
//! A first pass looks for a key inside the input; only when none is found does
//! a second pass look for the input inside a key.

use std::sync::LazyLock;

/// Source-language term to canonical dataset term, most specific first
const TRANSLATIONS: &[(&str, &str)] = &[
    ("peito de frango", "chicken breast"),
    ("pechuga de pollo", "chicken breast"),
    ("arroz integral", "brown rice"),
    ("batata doce", "sweet potato"),
    ("batata frita", "french fries"),
    ("papas fritas", "french fries"),
    ("carne moída", "ground beef"),
    ("carne moida", "ground beef"),
    ("carne molida", "ground beef"),
    ("carne de porco", "pork"),
    ("carne de res", "beef"),
    ("pão de queijo", "cheese bread"),
    ("pao de queijo", "cheese bread"),
    ("pão integral", "whole wheat bread"),
    ("pan integral", "whole wheat bread"),
    ("pan blanco", "white bread"),
    ("pão francês", "bread roll"),
    ("queijo", "cheese"),
    ("queso", "cheese"),
    ("frango", "chicken"),
    ("pollo", "chicken"),
    ("arroz", "rice"),
    ("feijão", "beans"),
    ("feijao", "beans"),
    ("frijoles", "beans"),
    ("lentilha", "lentils"),
    ("lentejas", "lentils"),
    ("batata", "potato"),
    ("macarrão", "pasta"),
    ("macarrao", "pasta"),
    ("fideos", "pasta"),
    ("salmão", "salmon"),
    ("salmao", "salmon"),
    ("atum", "tuna"),
    ("atún", "tuna"),
    ("peixe", "fish"),
    ("pescado", "fish"),
    ("presunto", "ham"),
    ("jamón", "ham"),
    ("cerdo", "pork"),
    ("carne", "beef"),
    ("huevo", "egg"),
    ("ovos", "eggs"),
    ("ovo", "egg"),
    ("leite", "milk"),
    ("leche", "milk"),
    ("iogurte", "yogurt"),
    ("yogur", "yogurt"),
    ("manteiga", "butter"),
    ("mantequilla", "butter"),
    ("pão", "bread"),
    ("aveia", "oats"),
    ("avena", "oats"),
    ("maçã", "apple"),
    ("manzana", "apple"),
    ("laranja", "orange"),
    ("naranja", "orange"),
    ("morango", "strawberry"),
    ("fresa", "strawberry"),
    ("abacate", "avocado"),
    ("aguacate", "avocado"),
    ("mamão", "papaya"),
    ("uva", "grape"),
    ("alface", "lettuce"),
    ("lechuga", "lettuce"),
    ("tomate", "tomato"),
    ("cenoura", "carrot"),
    ("zanahoria", "carrot"),
    ("cebolla", "onion"),
    ("cebola", "onion"),
    ("ensalada", "salad"),
    ("salada", "salad"),
    ("sorvete", "ice cream"),
    ("helado", "ice cream"),
    ("bolo", "cake"),
    ("açúcar", "sugar"),
    ("azúcar", "sugar"),
    ("suco", "juice"),
    ("jugo", "juice"),
    ("café", "coffee"),
];

static SHARED: LazyLock<TermNormalizer> =
    LazyLock::new(|| TermNormalizer::with_entries(TRANSLATIONS.iter().copied()));

/// Immutable term lookup
#[derive(Debug, Clone)]
pub struct TermNormalizer {
    entries: Vec<(String, String)>,
}

impl TermNormalizer {
    /// Build a normalizer from ordered `(source, canonical)` pairs
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(source, canonical)| (source.to_lowercase(), canonical.to_owned()))
                .collect(),
        }
    }

    /// The process-wide normalizer over the built-in dictionary
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Number of dictionary entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical form of `term`, or `term` unchanged when nothing maps
    #[must_use]
    pub fn normalize(&self, term: &str) -> String {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return term.to_owned();
        }

        self.entries
            .iter()
            .find(|(source, _)| needle.contains(source.as_str()))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(source, _)| source.contains(needle.as_str()))
            })
            .map_or_else(|| term.to_owned(), |(_, canonical)| canonical.clone())
    }
}

/// Normalize with the shared dictionary
#[must_use]
pub fn normalize(term: &str) -> String {
    TermNormalizer::shared().normalize(term)
}
