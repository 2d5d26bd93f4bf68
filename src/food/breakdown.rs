use serde::Serialize;

use crate::food::model::Nutrients;

pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;
pub const REFERENCE_DAILY_KCAL: f64 = 2000.0;

/// Share of calories from each macro, plus the share of a 2000 kcal day.
///
/// Calories are taken as given, never recomputed from the macros, so
/// inconsistent input gives percentages that do not add up to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroBreakdown {
    pub protein_pct: i64,
    pub carbs_pct: i64,
    pub fat_pct: i64,
    pub daily_value_pct: i64,
}

impl MacroBreakdown {
    pub fn from_nutrients(n: &Nutrients) -> Self {
        if n.calories_kcal == 0.0 {
            return Self {
                protein_pct: 0,
                carbs_pct: 0,
                fat_pct: 0,
                daily_value_pct: 0,
            };
        }
        Self {
            protein_pct: pct(n.protein_grams * KCAL_PER_GRAM_PROTEIN, n.calories_kcal),
            carbs_pct: pct(n.carbs_grams * KCAL_PER_GRAM_CARBS, n.calories_kcal),
            fat_pct: pct(n.fat_grams * KCAL_PER_GRAM_FAT, n.calories_kcal),
            daily_value_pct: pct(n.calories_kcal, REFERENCE_DAILY_KCAL),
        }
    }
}

fn pct(part: f64, whole: f64) -> i64 {
    (part / whole * 100.0).round() as i64
}
