//! Cleanup for free-text model output.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::food::error::CollaboratorError;
use crate::food::model::{FoodRecord, Nutrients};

lazy_static! {
    static ref FENCE_RE: Regex = Regex::new(r"```[A-Za-z]*").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

const DEFAULT_SERVING_GRAMS: f64 = 100.0;

/// Removes ```json / ``` markers the model adds despite being asked not to.
pub fn strip_code_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").trim().to_string()
}

/// Reduces an identification reply to a bare food name: first non-empty line,
/// markdown emphasis and a trailing period removed.
pub fn clean_food_name(raw: &str) -> Option<String> {
    let text = strip_code_fences(raw);
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let name = line
        .trim_start_matches(['#', '-', '>'])
        .replace(['*', '`', '_'], "")
        .trim()
        .trim_end_matches('.')
        .trim()
        .to_string();
    (!name.is_empty()).then_some(name)
}

/// `chicken tikka` -> `chicken-tikka`
pub fn slug(term: &str) -> String {
    WHITESPACE_RE
        .replace_all(term.trim(), "-")
        .to_lowercase()
}

#[derive(Debug, Deserialize)]
struct SynthesizedFood {
    food_name: Option<String>,
    serving_type: Option<String>,
    calories_calculated_for: Option<f64>,
    nutrients: SynthesizedNutrients,
}

#[derive(Debug, Deserialize)]
struct SynthesizedNutrients {
    calories: f64,
    protein: f64,
    carbs: f64,
    fats: f64,
}

/// Parses the JSON record produced by the synthesize-nutrition prompt.
pub fn parse_synthesized_record(term: &str, raw: &str) -> Result<FoodRecord, CollaboratorError> {
    let cleaned = strip_code_fences(raw);
    let food: SynthesizedFood = serde_json::from_str(&cleaned)
        .map_err(|e| CollaboratorError::Malformed(format!("synthesized record: {e}")))?;

    let n = &food.nutrients;
    let values = [n.calories, n.protein, n.carbs, n.fats];
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(CollaboratorError::Malformed(
            "nutrient values must be non-negative numbers".into(),
        ));
    }

    let name = food
        .food_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| term.trim().to_string());
    let grams = food
        .calories_calculated_for
        .filter(|g| g.is_finite() && *g > 0.0)
        .unwrap_or(DEFAULT_SERVING_GRAMS);
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

    Ok(FoodRecord {
        common_names: name.clone(),
        name,
        unique_id: format!("{}-{}", slug(term), millis),
        serving_description: food
            .serving_type
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "1 serving".into()),
        serving_mass_grams: grams,
        nutrients: Nutrients {
            calories_kcal: n.calories,
            protein_grams: n.protein,
            carbs_grams: n.carbs,
            fat_grams: n.fats,
        },
    })
}
