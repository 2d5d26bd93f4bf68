use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::{debug, info, instrument, warn};

use crate::food::error::{CollaboratorError, SearchError};
use crate::food::fallback::StaticFallbackTable;
use crate::food::history::HistorySink;
use crate::food::model::{FoodQuery, FoodRecord, FoodSource, ImagePayload, ResolvedResult};
use crate::food::parse::{clean_food_name, parse_synthesized_record};
use crate::food::ports::{FoodDatabase, GenerativeFoodModel};

/// Names tried when identification fails under `IdentifyFailurePolicy::RandomGuess`.
pub const GUESS_NAMES: [&str; 5] = ["Chicken Curry", "Butter Chicken", "Pizza", "Burger", "Salad"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifyFailurePolicy {
    #[default]
    Error,
    RandomGuess,
}

impl FromStr for IdentifyFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "random_guess" | "random-guess" => Ok(Self::RandomGuess),
            other => anyhow::bail!("unknown identify failure policy: {other}"),
        }
    }
}

/// What the static fallback returns for a query no keyword matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedQueryPolicy {
    #[default]
    DefaultBucket,
    EmptyResult,
}

impl FromStr for UnmatchedQueryPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default_bucket" | "default-bucket" => Ok(Self::DefaultBucket),
            "empty_result" | "empty-result" => Ok(Self::EmptyResult),
            other => anyhow::bail!("unknown unmatched query policy: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub database_timeout: Duration,
    pub identify_timeout: Duration,
    pub on_identify_failure: IdentifyFailurePolicy,
    pub unmatched_query: UnmatchedQueryPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            database_timeout: Duration::from_millis(5000),
            identify_timeout: Duration::from_millis(10000),
            on_identify_failure: IdentifyFailurePolicy::default(),
            unmatched_query: UnmatchedQueryPolicy::default(),
        }
    }
}

/// Turns a text or photo query into food records.
///
/// Sources are tried strictly in order: structured database, generative model,
/// static table. Each later call happens only if the previous one failed or came
/// back empty, and no call is retried.
pub struct FoodResolver {
    database: Arc<dyn FoodDatabase>,
    model: Arc<dyn GenerativeFoodModel>,
    fallback: StaticFallbackTable,
    config: ResolverConfig,
}

impl FoodResolver {
    pub fn new(
        database: Arc<dyn FoodDatabase>,
        model: Arc<dyn GenerativeFoodModel>,
        fallback: StaticFallbackTable,
        config: ResolverConfig,
    ) -> Self {
        Self {
            database,
            model,
            fallback,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub async fn resolve(
        &self,
        query: FoodQuery,
        history: &dyn HistorySink,
    ) -> Result<ResolvedResult, SearchError> {
        match query {
            FoodQuery::Text(text) => self.resolve_text(&text, history).await,
            FoodQuery::Image(image) => {
                let name = self.identify(&image).await?;
                info!(food = %name, "image identified");
                self.resolve_text(&name, history).await
            }
        }
    }

    #[instrument(skip(self, history))]
    async fn resolve_text(
        &self,
        text: &str,
        history: &dyn HistorySink,
    ) -> Result<ResolvedResult, SearchError> {
        let term = text.trim();
        if term.is_empty() {
            return Err(SearchError::InvalidQuery("search text is empty".into()));
        }

        // the intent to search counts even if every source fails
        history.record(term).await;

        match bounded(self.config.database_timeout, self.database.search(term)).await {
            Ok(items) if !items.is_empty() => {
                info!(count = items.len(), "answered by structured database");
                return Ok(ResolvedResult {
                    items,
                    source: FoodSource::StructuredDb,
                });
            }
            Ok(_) => debug!("structured database returned no items"),
            Err(e) => warn!(error = %e, "structured database unavailable"),
        }

        match self.synthesize(term).await {
            Ok(record) => {
                info!(food = %record.name, "answered by generative model");
                return Ok(ResolvedResult {
                    items: vec![record],
                    source: FoodSource::Generative,
                });
            }
            Err(e) => warn!(error = %e, "generative model did not answer"),
        }

        Ok(self.static_fallback(term))
    }

    async fn synthesize(&self, term: &str) -> Result<FoodRecord, CollaboratorError> {
        let raw = bounded(
            self.config.identify_timeout,
            self.model.synthesize_nutrition(term),
        )
        .await?;
        parse_synthesized_record(term, &raw)
    }

    fn static_fallback(&self, term: &str) -> ResolvedResult {
        let items = match self.fallback.lookup(term) {
            Some(items) => items.to_vec(),
            None => match self.config.unmatched_query {
                UnmatchedQueryPolicy::DefaultBucket => {
                    warn!(term, "no fallback keyword matched, using default bucket");
                    self.fallback.default_bucket().to_vec()
                }
                UnmatchedQueryPolicy::EmptyResult => Vec::new(),
            },
        };
        info!(count = items.len(), "answered by static fallback");
        ResolvedResult {
            items,
            source: FoodSource::StaticFallback,
        }
    }

    #[instrument(skip(self, image), fields(mime = %image.mime_type, bytes = image.data.len()))]
    async fn identify(&self, image: &ImagePayload) -> Result<String, SearchError> {
        let outcome = if image.data.is_empty() {
            Err("image payload is empty".to_string())
        } else {
            match bounded(self.config.identify_timeout, self.model.identify_food(image)).await {
                Ok(raw) => clean_food_name(&raw).ok_or_else(|| "model returned no food name".to_string()),
                Err(e) => Err(e.to_string()),
            }
        };

        match outcome {
            Ok(name) => Ok(name),
            Err(reason) => match self.config.on_identify_failure {
                IdentifyFailurePolicy::Error => {
                    warn!(%reason, "identification failed");
                    Err(SearchError::IdentificationFailed {
                        reason,
                        retry_with_text: true,
                    })
                }
                IdentifyFailurePolicy::RandomGuess => {
                    let guess = GUESS_NAMES
                        .choose(&mut rand::thread_rng())
                        .copied()
                        .unwrap_or(GUESS_NAMES[0]);
                    warn!(%reason, guess, "identification failed, guessing");
                    Ok(guess.to_string())
                }
            },
        }
    }
}

/// Runs a collaborator call under a deadline. Elapsed counts as a failure.
async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(CollaboratorError::Timeout(limit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::testing::{
        sample_record, FakeDatabase, FakeModel, RecordingHistory, Reply, SYNTHESIZED_JSON,
    };
    use bytes::Bytes;

    fn resolver_with(
        db: Arc<FakeDatabase>,
        model: Arc<FakeModel>,
        config: ResolverConfig,
    ) -> FoodResolver {
        FoodResolver::new(db, model, StaticFallbackTable::canonical(), config)
    }

    fn fast_config() -> ResolverConfig {
        ResolverConfig {
            database_timeout: Duration::from_millis(50),
            identify_timeout: Duration::from_millis(50),
            ..ResolverConfig::default()
        }
    }

    fn photo() -> FoodQuery {
        FoodQuery::Image(ImagePayload::new(
            Bytes::from_static(b"\xff\xd8\xff\xe0fake-jpeg"),
            Some("image/jpeg"),
        ))
    }

    #[tokio::test]
    async fn database_hit_never_touches_model() {
        let db = Arc::new(FakeDatabase::new(Reply::Ok(vec![sample_record("Ramen")])));
        let model = Arc::new(FakeModel::new(Reply::Fail, Reply::Ok(SYNTHESIZED_JSON.into())));
        let resolver = resolver_with(db.clone(), model.clone(), fast_config());
        let history = RecordingHistory::default();

        let res = resolver
            .resolve(FoodQuery::Text("ramen".into()), &history)
            .await
            .unwrap();

        assert_eq!(res.source, FoodSource::StructuredDb);
        assert_eq!(res.items[0].name, "Ramen");
        assert_eq!(db.calls(), 1);
        assert_eq!(model.total_calls(), 0);
    }

    #[tokio::test]
    async fn empty_database_falls_through_to_generative() {
        let db = Arc::new(FakeDatabase::new(Reply::Ok(vec![])));
        let model = Arc::new(FakeModel::new(Reply::Fail, Reply::Ok(SYNTHESIZED_JSON.into())));
        let resolver = resolver_with(db.clone(), model.clone(), fast_config());

        let res = resolver
            .resolve(FoodQuery::Text("spaghetti bolognese".into()), &RecordingHistory::default())
            .await
            .unwrap();

        assert_eq!(res.source, FoodSource::Generative);
        assert_eq!(res.items.len(), 1);
        assert_eq!(res.items[0].name, "Spaghetti Bolognese");
        assert_eq!(model.synthesize_calls(), 1);
    }

    #[tokio::test]
    async fn database_error_falls_through_to_generative() {
        let db = Arc::new(FakeDatabase::new(Reply::Fail));
        let model = Arc::new(FakeModel::new(Reply::Fail, Reply::Ok(SYNTHESIZED_JSON.into())));
        let resolver = resolver_with(db, model, fast_config());

        let res = resolver
            .resolve(FoodQuery::Text("bolognese".into()), &RecordingHistory::default())
            .await
            .unwrap();
        assert_eq!(res.source, FoodSource::Generative);
    }

    #[tokio::test]
    async fn slow_database_is_cut_off_by_timeout() {
        let db = Arc::new(FakeDatabase::new(Reply::Hang(Duration::from_secs(5))));
        let model = Arc::new(FakeModel::new(Reply::Fail, Reply::Ok(SYNTHESIZED_JSON.into())));
        let resolver = resolver_with(db, model, fast_config());

        let started = std::time::Instant::now();
        let res = resolver
            .resolve(FoodQuery::Text("bolognese".into()), &RecordingHistory::default())
            .await
            .unwrap();
        assert_eq!(res.source, FoodSource::Generative);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn cheese_pizza_lands_in_pizza_bucket_when_both_sources_fail() {
        let db = Arc::new(FakeDatabase::new(Reply::Ok(vec![])));
        let model = Arc::new(FakeModel::failing());
        let resolver = resolver_with(db, model, fast_config());

        let res = resolver
            .resolve(FoodQuery::Text("cheese pizza".into()), &RecordingHistory::default())
            .await
            .unwrap();

        assert_eq!(res.source, FoodSource::StaticFallback);
        let names: Vec<_> = res.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Cheese Pizza (Slice)", "Pepperoni Pizza (Slice)"]);
    }

    #[tokio::test]
    async fn unparseable_synthesis_falls_back_to_static() {
        let db = Arc::new(FakeDatabase::new(Reply::Fail));
        let model = Arc::new(FakeModel::new(
            Reply::Fail,
            Reply::Ok("I think a burger has about 500 calories.".into()),
        ));
        let resolver = resolver_with(db, model, fast_config());

        let res = resolver
            .resolve(FoodQuery::Text("whopper".into()), &RecordingHistory::default())
            .await
            .unwrap();
        assert_eq!(res.source, FoodSource::StaticFallback);
        assert_eq!(res.items[0].unique_id, "burger-masala-123");
    }

    #[tokio::test]
    async fn unmatched_query_follows_policy() {
        let db = Arc::new(FakeDatabase::new(Reply::Fail));
        let model = Arc::new(FakeModel::failing());

        let parity = resolver_with(db.clone(), model.clone(), fast_config());
        let res = parity
            .resolve(FoodQuery::Text("spaghetti".into()), &RecordingHistory::default())
            .await
            .unwrap();
        assert_eq!(res.source, FoodSource::StaticFallback);
        assert_eq!(res.items[0].name, "Chicken Curry");

        let strict = resolver_with(
            db,
            model,
            ResolverConfig {
                unmatched_query: UnmatchedQueryPolicy::EmptyResult,
                ..fast_config()
            },
        );
        let res = strict
            .resolve(FoodQuery::Text("spaghetti".into()), &RecordingHistory::default())
            .await
            .unwrap();
        assert_eq!(res.source, FoodSource::StaticFallback);
        assert!(res.items.is_empty());
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_any_call() {
        let db = Arc::new(FakeDatabase::new(Reply::Ok(vec![sample_record("Soup")])));
        let model = Arc::new(FakeModel::failing());
        let resolver = resolver_with(db.clone(), model.clone(), fast_config());
        let history = RecordingHistory::default();

        let err = resolver
            .resolve(FoodQuery::Text("   ".into()), &history)
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::InvalidQuery(_)));
        assert_eq!(db.calls(), 0);
        assert_eq!(model.total_calls(), 0);
        assert!(history.recorded().await.is_empty());
    }

    #[tokio::test]
    async fn history_recorded_once_even_when_everything_fails() {
        let db = Arc::new(FakeDatabase::new(Reply::Fail));
        let model = Arc::new(FakeModel::failing());
        let resolver = resolver_with(db, model, fast_config());
        let history = RecordingHistory::default();

        resolver
            .resolve(FoodQuery::Text("  tacos ".into()), &history)
            .await
            .unwrap();
        assert_eq!(history.recorded().await, vec!["tacos".to_string()]);
    }

    #[tokio::test]
    async fn every_nonempty_text_yields_items_by_default() {
        let db = Arc::new(FakeDatabase::new(Reply::Fail));
        let model = Arc::new(FakeModel::failing());
        let resolver = resolver_with(db, model, fast_config());

        for q in ["x", "kimchi", "BURGER", "butter chicken", "🍕"] {
            let res = resolver
                .resolve(FoodQuery::Text(q.into()), &RecordingHistory::default())
                .await
                .unwrap();
            assert!(!res.items.is_empty(), "no items for {q}");
        }
    }

    #[tokio::test]
    async fn identified_image_reenters_text_pipeline() {
        let db = Arc::new(FakeDatabase::new(Reply::Ok(vec![sample_record("Pho")])));
        let model = Arc::new(FakeModel::new(Reply::Ok("  **Pho**\n".into()), Reply::Fail));
        let resolver = resolver_with(db.clone(), model.clone(), fast_config());
        let history = RecordingHistory::default();

        let res = resolver.resolve(photo(), &history).await.unwrap();

        assert_eq!(res.source, FoodSource::StructuredDb);
        assert_eq!(history.recorded().await, vec!["Pho".to_string()]);
        assert_eq!(model.identify_calls(), 1);
        assert_eq!(db.calls(), 1);
    }

    #[tokio::test]
    async fn identified_image_can_cascade_to_static_fallback() {
        let db = Arc::new(FakeDatabase::new(Reply::Ok(vec![])));
        let model = Arc::new(FakeModel::new(Reply::Ok("Pepperoni pizza".into()), Reply::Fail));
        let resolver = resolver_with(db, model, fast_config());

        let res = resolver
            .resolve(photo(), &RecordingHistory::default())
            .await
            .unwrap();
        assert_eq!(res.source, FoodSource::StaticFallback);
        assert_eq!(res.items.len(), 2);
    }

    #[tokio::test]
    async fn failed_identification_is_reported_by_default() {
        let db = Arc::new(FakeDatabase::new(Reply::Ok(vec![sample_record("Soup")])));
        let model = Arc::new(FakeModel::failing());
        let resolver = resolver_with(db.clone(), model, fast_config());
        let history = RecordingHistory::default();

        let err = resolver.resolve(photo(), &history).await.unwrap_err();

        match err {
            SearchError::IdentificationFailed { retry_with_text, .. } => assert!(retry_with_text),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.calls(), 0);
        assert!(history.recorded().await.is_empty());
    }

    #[tokio::test]
    async fn empty_image_fails_without_calling_model() {
        let db = Arc::new(FakeDatabase::new(Reply::Fail));
        let model = Arc::new(FakeModel::new(Reply::Ok("Pizza".into()), Reply::Fail));
        let resolver = resolver_with(db, model.clone(), fast_config());

        let empty = FoodQuery::Image(ImagePayload::new(Bytes::new(), None));
        let err = resolver
            .resolve(empty, &RecordingHistory::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::IdentificationFailed { .. }));
        assert_eq!(model.identify_calls(), 0);
    }

    #[tokio::test]
    async fn random_guess_policy_picks_a_known_food() {
        let db = Arc::new(FakeDatabase::new(Reply::Fail));
        let model = Arc::new(FakeModel::new(Reply::Hang(Duration::from_secs(5)), Reply::Fail));
        let resolver = resolver_with(
            db,
            model,
            ResolverConfig {
                on_identify_failure: IdentifyFailurePolicy::RandomGuess,
                ..fast_config()
            },
        );
        let history = RecordingHistory::default();

        let res = resolver.resolve(photo(), &history).await.unwrap();

        assert_eq!(res.source, FoodSource::StaticFallback);
        assert!(!res.items.is_empty());
        let recorded = history.recorded().await;
        assert_eq!(recorded.len(), 1);
        assert!(GUESS_NAMES.contains(&recorded[0].as_str()));
    }

    #[test]
    fn policies_parse_from_config_strings() {
        assert_eq!(
            "random_guess".parse::<IdentifyFailurePolicy>().unwrap(),
            IdentifyFailurePolicy::RandomGuess
        );
        assert_eq!(
            "Empty-Result".parse::<UnmatchedQueryPolicy>().unwrap(),
            UnmatchedQueryPolicy::EmptyResult
        );
        assert!("sometimes".parse::<IdentifyFailurePolicy>().is_err());
    }

    #[tokio::test]
    async fn identification_reason_never_contains_api_key() {
        let gemini = crate::clients::GeminiClient::new(&crate::config::GeminiConfig {
            api_key: "SUPER-SECRET-KEY".into(),
            model: "gemini-1.5-flash".into(),
            base_url: "http://127.0.0.1:1".into(),
        });
        let resolver = FoodResolver::new(
            Arc::new(FakeDatabase::new(Reply::Fail)),
            Arc::new(gemini),
            StaticFallbackTable::canonical(),
            ResolverConfig {
                identify_timeout: Duration::from_secs(2),
                ..fast_config()
            },
        );

        let err = resolver
            .resolve(photo(), &RecordingHistory::default())
            .await
            .unwrap_err();

        match err {
            SearchError::IdentificationFailed { reason, .. } => {
                assert!(!reason.contains("SUPER-SECRET-KEY"), "{reason}");
            }
            other => panic!("expected identification failure, got {other:?}"),
        }
    }
}
