use async_trait::async_trait;

use crate::food::error::CollaboratorError;
use crate::food::model::{FoodRecord, ImagePayload};

/// Structured nutrient lookup keyed by a search term.
#[async_trait]
pub trait FoodDatabase: Send + Sync {
    async fn search(&self, term: &str) -> Result<Vec<FoodRecord>, CollaboratorError>;
}

/// Generative model used for photo identification and synthetic nutrition.
///
/// Every method returns the model's raw text; cleanup and parsing belong to the
/// caller because the model routinely ignores formatting instructions.
#[async_trait]
pub trait GenerativeFoodModel: Send + Sync {
    /// Name the food shown in `image`.
    async fn identify_food(&self, image: &ImagePayload) -> Result<String, CollaboratorError>;

    /// JSON describing plausible nutrition for `name`.
    async fn synthesize_nutrition(&self, name: &str) -> Result<String, CollaboratorError>;

    /// JSON array of short `{text, icon}` health insights for `food`.
    async fn health_insights(&self, food: &FoodRecord) -> Result<String, CollaboratorError>;
}
