use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::food::ResolverConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub gemini: GeminiConfig,
    pub food_api: FoodApiConfig,
    pub resolver: ResolverConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: env_or("JWT_ISSUER", "nutrilens"),
            audience: env_or("JWT_AUDIENCE", "nutrilens-users"),
            ttl_minutes: env_parsed("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parsed("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let gemini = GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?,
            model: env_or("GEMINI_MODEL", "gemini-1.5-flash"),
            base_url: env_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
        };
        let food_api = FoodApiConfig {
            base_url: std::env::var("FOOD_API_URL").context("FOOD_API_URL must be set")?,
            api_key: std::env::var("FOOD_API_KEY").ok().filter(|k| !k.is_empty()),
        };
        let resolver = resolver_from_env()?;

        Ok(Self {
            database_url,
            jwt,
            gemini,
            food_api,
            resolver,
        })
    }
}

/// Milliseconds from `key`, or `default` when unset. Garbage or zero is an error.
fn env_millis(key: &str, default: Duration) -> anyhow::Result<Duration> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(default);
    };
    let ms: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of milliseconds, got {raw:?}"))?;
    if ms == 0 {
        anyhow::bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_millis(ms))
}

fn resolver_from_env() -> anyhow::Result<ResolverConfig> {
    let defaults = ResolverConfig::default();
    let mut config = ResolverConfig {
        database_timeout: env_millis("FOOD_DB_TIMEOUT_MS", defaults.database_timeout)?,
        identify_timeout: env_millis("IDENTIFY_TIMEOUT_MS", defaults.identify_timeout)?,
        ..defaults
    };
    // Unknown policy names are a startup error, like bad timeouts.
    if let Ok(v) = std::env::var("ON_IDENTIFY_FAILURE") {
        config.on_identify_failure = v.parse()?;
    }
    if let Ok(v) = std::env::var("UNMATCHED_QUERY_POLICY") {
        config.unmatched_query = v.parse()?;
    }
    Ok(config)
}
