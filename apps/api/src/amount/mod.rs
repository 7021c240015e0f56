//! Purchase price in words.
//!
//! `AppState` holds an `Arc<dyn AmountSpeller>`: the LLM backend wrapped in a
//! rule-based fallback by default, or the rule backend alone (`AMOUNT_SPELLER=rules`).

pub mod handlers;
pub mod hungarian;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use redis::Client as RedisClient;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::amount::prompts::AMOUNT_WORDS_PROMPT;
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;

const CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[async_trait]
pub trait AmountSpeller: Send + Sync {
    /// Capitalised Hungarian words for `amount`.
    async fn spell(&self, amount: u64) -> Result<String, AppError>;

    /// Short backend name, used in cache keys and logs.
    fn backend(&self) -> &'static str;

    /// Spells `amount` and names the backend whose words came back.
    async fn spell_attributed(&self, amount: u64) -> Result<(String, &'static str), AppError> {
        Ok((self.spell(amount).await?, self.backend()))
    }
}

/// Deterministic speller. Never calls out.
pub struct RuleAmountSpeller;

#[async_trait]
impl AmountSpeller for RuleAmountSpeller {
    async fn spell(&self, amount: u64) -> Result<String, AppError> {
        hungarian::spell(amount)
            .map(|w| hungarian::capitalize(&w))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Amount {amount} exceeds {}",
                    hungarian::MAX_SPELLABLE
                ))
            })
    }

    fn backend(&self) -> &'static str {
        "rules"
    }
}

#[derive(Debug, Deserialize)]
struct WordsOutput {
    words: String,
}

/// Asks the language model to write the amount out.
pub struct LlmAmountSpeller {
    llm: LlmClient,
}

impl LlmAmountSpeller {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AmountSpeller for LlmAmountSpeller {
    async fn spell(&self, amount: u64) -> Result<String, AppError> {
        let prompt = AMOUNT_WORDS_PROMPT.replace("{number}", &amount.to_string());
        let output: WordsOutput = self
            .llm
            .call_json(&prompt, JSON_ONLY_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Amount spelling failed: {e}")))?;

        let words = output.words.trim();
        if words.is_empty() {
            return Err(AppError::Llm("Model returned empty words".to_string()));
        }
        Ok(hungarian::capitalize(words))
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// Uses `primary`, and the rule speller whenever `primary` fails.
pub struct FallbackSpeller {
    primary: Arc<dyn AmountSpeller>,
    fallback: RuleAmountSpeller,
}

impl FallbackSpeller {
    pub fn new(primary: Arc<dyn AmountSpeller>) -> Self {
        Self {
            primary,
            fallback: RuleAmountSpeller,
        }
    }
}

#[async_trait]
impl AmountSpeller for FallbackSpeller {
    async fn spell(&self, amount: u64) -> Result<String, AppError> {
        Ok(self.spell_attributed(amount).await?.0)
    }

    fn backend(&self) -> &'static str {
        self.primary.backend()
    }

    async fn spell_attributed(&self, amount: u64) -> Result<(String, &'static str), AppError> {
        match self.primary.spell_attributed(amount).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!(
                    "{} speller failed for {amount}, using rules: {e}",
                    self.primary.backend()
                );
                self.fallback.spell_attributed(amount).await
            }
        }
    }
}

fn cache_key(backend: &str, amount: u64) -> String {
    format!("amount_words:{backend}:{amount}")
}

async fn cache_get(redis: &RedisClient, key: &str) -> redis::RedisResult<Option<String>> {
    let mut con = redis.get_multiplexed_async_connection().await?;
    redis::cmd("GET")
        .arg(key)
        .query_async::<_, Option<String>>(&mut con)
        .await
}

async fn cache_set(redis: &RedisClient, key: &str, words: &str) -> redis::RedisResult<()> {
    let mut con = redis.get_multiplexed_async_connection().await?;
    redis::cmd("SET")
        .arg(key)
        .arg(words)
        .arg("EX")
        .arg(CACHE_TTL_SECS)
        .query_async::<_, ()>(&mut con)
        .await
}

/// Only answers from the backend the cache key names are stored, so a
/// fallback answer never stands in for the primary's.
fn cacheable(keyed_backend: &str, answered: &str) -> bool {
    keyed_backend == answered
}

/// Spells `amount`, consulting the Redis cache first. Cache trouble is never fatal.
pub async fn spell_cached(
    speller: &dyn AmountSpeller,
    redis: &RedisClient,
    amount: u64,
) -> Result<String, AppError> {
    let key = cache_key(speller.backend(), amount);

    match cache_get(redis, &key).await {
        Ok(Some(words)) => {
            debug!("Amount words cache hit for {key}");
            return Ok(words);
        }
        Ok(None) => {}
        Err(e) => warn!("Amount words cache read failed: {e}"),
    }

    let (words, answered) = speller.spell_attributed(amount).await?;

    if !cacheable(speller.backend(), answered) {
        debug!("Not caching {key}: answered by {answered}");
        return Ok(words);
    }
    if let Err(e) = cache_set(redis, &key, &words).await {
        warn!("Amount words cache write failed: {e}");
    }
    Ok(words)
}
