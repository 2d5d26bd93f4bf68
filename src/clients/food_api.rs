use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::FoodApiConfig;
use crate::food::{CollaboratorError, FoodDatabase, FoodRecord, Nutrients};

/// HTTP client for the structured food search service.
#[derive(Debug, Clone)]
pub struct HttpFoodDatabase {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RawFood>,
}

#[derive(Debug, Deserialize)]
struct RawFood {
    food_name: Option<String>,
    #[serde(default)]
    common_names: Option<String>,
    food_unique_id: Option<serde_json::Value>,
    food_id: Option<serde_json::Value>,
    serving_type: Option<String>,
    calories_calculated_for: Option<f64>,
    basic_unit_measure: Option<f64>,
    nutrients: Option<RawNutrients>,
}

#[derive(Debug, Deserialize)]
struct RawNutrients {
    #[serde(default)]
    calories: f64,
    #[serde(default)]
    protein: f64,
    #[serde(default)]
    carbs: f64,
    #[serde(default)]
    fats: f64,
}

impl HttpFoodDatabase {
    pub fn new(config: &FoodApiConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

fn id_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Maps one service record onto `FoodRecord`. Records without a name or
/// nutrients, or with negative values, are dropped.
fn normalize(raw: RawFood, index: usize) -> Option<FoodRecord> {
    let name = raw.food_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
    let n = raw.nutrients?;
    if [n.calories, n.protein, n.carbs, n.fats]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        return None;
    }
    let unique_id = raw
        .food_unique_id
        .as_ref()
        .and_then(id_to_string)
        .or_else(|| raw.food_id.as_ref().and_then(id_to_string))
        .unwrap_or_else(|| format!("{}-{}", crate::food::parse::slug(&name), index));
    let grams = raw
        .calories_calculated_for
        .or(raw.basic_unit_measure)
        .filter(|g| *g > 0.0)
        .unwrap_or(100.0);

    Some(FoodRecord {
        common_names: raw.common_names.unwrap_or_default(),
        unique_id,
        serving_description: raw.serving_type.unwrap_or_else(|| "1 serving".into()),
        serving_mass_grams: grams,
        nutrients: Nutrients {
            calories_kcal: n.calories,
            protein_grams: n.protein,
            carbs_grams: n.carbs,
            fat_grams: n.fats,
        },
        name,
    })
}

#[async_trait]
impl FoodDatabase for HttpFoodDatabase {
    async fn search(&self, term: &str) -> Result<Vec<FoodRecord>, CollaboratorError> {
        let url = format!("{}/searchFood", self.base_url);
        let mut request = self.client.get(&url).query(&[("term", term)]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, term, "food api returned error");
            return Err(CollaboratorError::Status(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        let total = body.items.len();
        let items: Vec<FoodRecord> = body
            .items
            .into_iter()
            .enumerate()
            .filter_map(|(i, raw)| normalize(raw, i))
            .collect();
        debug!(term, total, kept = items.len(), "food api answered");
        Ok(items)
    }
}
