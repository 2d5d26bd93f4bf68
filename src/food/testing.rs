use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::food::error::CollaboratorError;
use crate::food::history::HistorySink;
use crate::food::model::{FoodRecord, ImagePayload, Nutrients};
use crate::food::ports::{FoodDatabase, GenerativeFoodModel};

/// Scripted outcome of one fake collaborator call.
#[derive(Clone)]
pub enum Reply<T> {
    Ok(T),
    Fail,
    Hang(Duration),
}

impl<T: Clone> Reply<T> {
    async fn play(&self) -> Result<T, CollaboratorError> {
        match self {
            Reply::Ok(v) => Ok(v.clone()),
            Reply::Fail => Err(CollaboratorError::Transport("connection refused".into())),
            Reply::Hang(d) => {
                tokio::time::sleep(*d).await;
                Err(CollaboratorError::Transport("hung call finished".into()))
            }
        }
    }
}

pub struct FakeDatabase {
    reply: Reply<Vec<FoodRecord>>,
    pub calls: AtomicUsize,
}

impl FakeDatabase {
    pub fn new(reply: Reply<Vec<FoodRecord>>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FoodDatabase for FakeDatabase {
    async fn search(&self, _term: &str) -> Result<Vec<FoodRecord>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.play().await
    }
}

pub struct FakeModel {
    identify: Reply<String>,
    synthesize: Reply<String>,
    insights: Reply<String>,
    identify_calls: AtomicUsize,
    synthesize_calls: AtomicUsize,
}

impl FakeModel {
    pub fn new(identify: Reply<String>, synthesize: Reply<String>) -> Self {
        Self {
            identify,
            synthesize,
            insights: Reply::Fail,
            identify_calls: AtomicUsize::new(0),
            synthesize_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::new(Reply::Fail, Reply::Fail)
    }

    pub fn with_insights(mut self, insights: Reply<String>) -> Self {
        self.insights = insights;
        self
    }

    pub fn identify_calls(&self) -> usize {
        self.identify_calls.load(Ordering::SeqCst)
    }

    pub fn synthesize_calls(&self) -> usize {
        self.synthesize_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.identify_calls() + self.synthesize_calls()
    }
}

#[async_trait]
impl GenerativeFoodModel for FakeModel {
    async fn identify_food(&self, _image: &ImagePayload) -> Result<String, CollaboratorError> {
        self.identify_calls.fetch_add(1, Ordering::SeqCst);
        self.identify.play().await
    }

    async fn synthesize_nutrition(&self, _name: &str) -> Result<String, CollaboratorError> {
        self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
        self.synthesize.play().await
    }

    async fn health_insights(&self, _food: &FoodRecord) -> Result<String, CollaboratorError> {
        self.insights.play().await
    }
}

#[derive(Default)]
pub struct RecordingHistory {
    pub terms: Mutex<Vec<String>>,
}

impl RecordingHistory {
    pub async fn recorded(&self) -> Vec<String> {
        self.terms.lock().await.clone()
    }
}

#[async_trait]
impl HistorySink for RecordingHistory {
    async fn record(&self, term: &str) {
        self.terms.lock().await.push(term.to_string());
    }
}

pub fn sample_record(name: &str) -> FoodRecord {
    FoodRecord {
        name: name.into(),
        common_names: String::new(),
        unique_id: format!("{}-1", name.to_lowercase()),
        serving_description: "1 bowl".into(),
        serving_mass_grams: 250.0,
        nutrients: Nutrients {
            calories_kcal: 310.0,
            protein_grams: 12.0,
            carbs_grams: 45.0,
            fat_grams: 9.0,
        },
    }
}

pub const SYNTHESIZED_JSON: &str = r#"```json
{"food_name": "Spaghetti Bolognese", "serving_type": "1 plate", "calories_calculated_for": 300,
 "nutrients": {"calories": 480, "protein": 24, "carbs": 58, "fats": 16}}
```"#;
