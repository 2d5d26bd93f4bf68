use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::food::FoodRecord;

#[derive(Debug, Clone, FromRow)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food: Json<FoodRecord>,
    pub meal_type: String,
    pub date: OffsetDateTime,
    pub created_at: OffsetDateTime,
}
