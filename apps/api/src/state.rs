use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::amount::AmountSpeller;
use crate::config::Config;
use crate::pdf::assets::TemplateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Cache for spelled-out prices.
    pub redis: RedisClient,
    /// Storage for the `storage` PDF delivery mode.
    pub s3: S3Client,
    pub config: Config,
    /// Rule based, or LLM backed with the rule based speller as fallback. Set by AMOUNT_SPELLER.
    pub speller: Arc<dyn AmountSpeller>,
    pub templates: TemplateStore,
}
