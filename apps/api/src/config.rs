use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Which backend spells the purchase price in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellerBackend {
    Llm,
    Rules,
}

impl SpellerBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(SpellerBackend::Llm),
            "rules" => Ok(SpellerBackend::Rules),
            other => bail!("AMOUNT_SPELLER must be 'llm' or 'rules', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub shared_password: String,
    /// Base URL the templates and font are fetched from. Takes precedence over `asset_dir`.
    pub asset_base_url: Option<String>,
    pub asset_dir: PathBuf,
    /// Font path relative to the asset root. Empty means the built-in Helvetica.
    pub font_file: Option<String>,
    pub pdf_font_size: f32,
    pub job_expiry_hours: i64,
    pub amount_speller: SpellerBackend,
    pub presigned_url_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let font_file = optional_env("FONT_FILE")
            .unwrap_or_else(|| "fonts/DejaVuSans.ttf".to_string());

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            shared_password: require_env("SHARED_PASSWORD")?,
            asset_base_url: optional_env("ASSET_BASE_URL"),
            asset_dir: PathBuf::from(
                optional_env("ASSET_DIR").unwrap_or_else(|| "assets".to_string()),
            ),
            font_file: (font_file != "none").then_some(font_file),
            pdf_font_size: parse_env("PDF_FONT_SIZE", 12.0)?,
            job_expiry_hours: parse_env("JOB_EXPIRY_HOURS", 48)?,
            amount_speller: SpellerBackend::parse(
                &optional_env("AMOUNT_SPELLER").unwrap_or_else(|| "llm".to_string()),
            )?,
            presigned_url_ttl_secs: parse_env("PRESIGNED_URL_TTL_SECS", 3600)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
