use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::GeminiConfig;
use crate::food::{CollaboratorError, FoodRecord, GenerativeFoodModel, ImagePayload};

const API_KEY_HEADER: &str = "x-goog-api-key";

const IDENTIFY_PROMPT: &str = "What food is in this image? Return only the food name without any additional text, markdown, or explanations.";

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model_name: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model_name: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String, CollaboratorError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model_name);
        let request = GeminiRequest {
            contents: vec![Content { role: "user", parts }],
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let e = CollaboratorError::from(e);
                error!(error = %e, "gemini request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "gemini returned error");
            return Err(CollaboratorError::Status(status.as_u16()));
        }

        let parsed: GeminiResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CollaboratorError::Malformed("gemini returned no text".into()))?;
        debug!(model = %self.model_name, chars = text.len(), "gemini answered");
        Ok(text)
    }
}

fn synthesize_prompt(name: &str) -> String {
    format!(
        r#"Given the food "{name}", generate realistic nutritional information.
Return ONLY a valid JSON object with this structure:
{{
  "food_name": "The food name",
  "serving_type": "Standard serving size",
  "calories_calculated_for": numeric value in grams,
  "nutrients": {{
    "calories": calories per serving,
    "protein": grams of protein,
    "carbs": grams of carbs,
    "fats": grams of fat
  }}
}}
Make the values realistic for the food type. Only return valid JSON with no markdown formatting, backticks, or additional text."#
    )
}

fn insights_prompt(food: &FoodRecord) -> String {
    let n = &food.nutrients;
    format!(
        r#"Provide 3 short health insights about {} with these nutritional facts:
- Calories: {} kcal
- Protein: {}g
- Carbs: {}g
- Fat: {}g

Format your response as a JSON array with each object having "text" and "icon" fields.
Keep each insight under 100 characters.
Include emojis in the icon field.
Don't include backticks, markdown formatting, or any other non-JSON syntax in your response."#,
        food.name, n.calories_kcal, n.protein_grams, n.carbs_grams, n.fat_grams
    )
}

#[async_trait]
impl GenerativeFoodModel for GeminiClient {
    async fn identify_food(&self, image: &ImagePayload) -> Result<String, CollaboratorError> {
        let encoded = general_purpose::STANDARD.encode(&image.data);
        self.generate(vec![
            Part::Text {
                text: IDENTIFY_PROMPT.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: encoded,
                },
            },
        ])
        .await
    }

    async fn synthesize_nutrition(&self, name: &str) -> Result<String, CollaboratorError> {
        self.generate(vec![Part::Text {
            text: synthesize_prompt(name),
        }])
        .await
    }

    async fn health_insights(&self, food: &FoodRecord) -> Result<String, CollaboratorError> {
        self.generate(vec![Part::Text {
            text: insights_prompt(food),
        }])
        .await
    }
}
