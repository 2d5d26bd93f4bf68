use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::food::breakdown::REFERENCE_DAILY_KCAL;
use crate::food::error::CollaboratorError;
use crate::food::model::FoodRecord;
use crate::food::parse::strip_code_fences;
use crate::food::ports::GenerativeFoodModel;

const MAX_INSIGHTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub text: String,
    pub icon: String,
}

/// Short health notes for a food. Falls back to templated notes built from the
/// record itself when the model is unavailable or answers with non-JSON.
pub async fn generate_insights(
    model: &dyn GenerativeFoodModel,
    food: &FoodRecord,
    limit: Duration,
) -> Vec<Insight> {
    let reply = tokio::time::timeout(limit, model.health_insights(food))
        .await
        .unwrap_or(Err(CollaboratorError::Timeout(limit)));

    match reply.and_then(|raw| parse_insights(&raw)) {
        Ok(insights) => insights,
        Err(e) => {
            warn!(error = %e, food = %food.name, "using templated insights");
            templated_insights(food)
        }
    }
}

pub fn parse_insights(raw: &str) -> Result<Vec<Insight>, CollaboratorError> {
    let mut insights: Vec<Insight> = serde_json::from_str(&strip_code_fences(raw))
        .map_err(|e| CollaboratorError::Malformed(format!("insights: {e}")))?;
    insights.retain(|i| !i.text.trim().is_empty());
    if insights.is_empty() {
        return Err(CollaboratorError::Malformed("insights: empty list".into()));
    }
    insights.truncate(MAX_INSIGHTS);
    Ok(insights)
}

pub fn templated_insights(food: &FoodRecord) -> Vec<Insight> {
    let n = &food.nutrients;
    vec![
        Insight {
            text: format!(
                "{} provides {}g of protein, supporting muscle growth.",
                food.name,
                n.protein_grams.round()
            ),
            icon: "💪".into(),
        },
        Insight {
            text: format!(
                "With {} calories, this represents about {}% of daily intake.",
                n.calories_kcal.round(),
                (n.calories_kcal / REFERENCE_DAILY_KCAL * 100.0).round()
            ),
            icon: "🔥".into(),
        },
        Insight {
            text: format!(
                "Balance your meal with vegetables to complement the {}g of carbs in this serving.",
                n.carbs_grams.round()
            ),
            icon: "🥗".into(),
        },
    ]
}
