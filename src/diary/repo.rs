use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::diary::dto::MealType;
use crate::diary::repo_types::DiaryEntry;
use crate::food::FoodRecord;

impl DiaryEntry {
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        food: &FoodRecord,
        meal_type: MealType,
        date: OffsetDateTime,
    ) -> anyhow::Result<DiaryEntry> {
        let entry = sqlx::query_as::<_, DiaryEntry>(
            r#"
            INSERT INTO diary_entries (user_id, food, meal_type, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, food, meal_type, date, created_at
            "#,
        )
        .bind(user_id)
        .bind(Json(food))
        .bind(meal_type.as_str())
        .bind(date)
        .fetch_one(db)
        .await?;
        Ok(entry)
    }

    /// Newest first by entry date.
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DiaryEntry>> {
        let rows = sqlx::query_as::<_, DiaryEntry>(
            r#"
            SELECT id, user_id, food, meal_type, date, created_at
            FROM diary_entries
            WHERE user_id = $1
            ORDER BY date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM diary_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
