use serde::{Deserialize, Serialize};

use crate::food::insights::Insight;
use crate::food::{FoodRecord, FoodSource, MacroBreakdown, ResolvedResult, SearchHistory};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// One record plus the percentages the result card shows.
#[derive(Debug, Serialize)]
pub struct SearchItem {
    pub food: FoodRecord,
    pub breakdown: MacroBreakdown,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub source: FoodSource,
    pub items: Vec<SearchItem>,
}

impl From<ResolvedResult> for SearchResponse {
    fn from(result: ResolvedResult) -> Self {
        Self {
            source: result.source,
            items: result
                .items
                .into_iter()
                .map(|food| SearchItem {
                    breakdown: MacroBreakdown::from_nutrients(&food.nutrients),
                    food,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: SearchHistory,
}

#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    pub food: FoodRecord,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<Insight>,
}
