use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::food::error::SearchError;

/// Macro and energy values for one serving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories_kcal: f64,
    pub protein_grams: f64,
    pub carbs_grams: f64,
    pub fat_grams: f64,
}

/// Normalized food item returned by every source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub name: String,
    #[serde(default)]
    pub common_names: String,
    pub unique_id: String,
    pub serving_description: String,
    pub serving_mass_grams: f64,
    pub nutrients: Nutrients,
}

/// Raw image bytes plus the MIME type reported by the uploader.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub data: Bytes,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn new(data: Bytes, mime_type: Option<&str>) -> Self {
        Self {
            data,
            mime_type: mime_type
                .filter(|m| !m.is_empty())
                .unwrap_or("image/jpeg")
                .to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FoodQuery {
    Text(String),
    Image(ImagePayload),
}

impl FoodQuery {
    /// Builds a query from optional form inputs. An image always wins over text
    /// when both are supplied.
    pub fn from_parts(text: Option<String>, image: Option<ImagePayload>) -> Result<Self, SearchError> {
        if let Some(image) = image {
            return Ok(FoodQuery::Image(image));
        }
        match text.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => Ok(FoodQuery::Text(t)),
            _ => Err(SearchError::InvalidQuery(
                "provide a food name or a photo".into(),
            )),
        }
    }
}

/// Which collaborator answered a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoodSource {
    StructuredDb,
    Generative,
    StaticFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedResult {
    pub items: Vec<FoodRecord>,
    pub source: FoodSource,
}
