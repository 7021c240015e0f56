mod amount;
mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod pdf;
mod records;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use chrono::Utc;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::amount::{AmountSpeller, FallbackSpeller, LlmAmountSpeller, RuleAmountSpeller};
use crate::config::{Config, SpellerBackend};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::pdf::assets::TemplateStore;
use crate::records::jobs::{expiry_cutoff, sweep_expired_jobs};
use crate::routes::build_router;
use crate::state::AppState;

const JOB_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting kitolto API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let speller = build_speller(&config)?;
    info!("Amount speller: {}", speller.backend());

    let templates = TemplateStore::from_config(&config)?;

    spawn_job_sweeper(db.clone(), config.job_expiry_hours);

    // Build app state
    let state = AppState {
        db,
        redis,
        s3,
        config: config.clone(),
        speller,
        templates,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_speller(config: &Config) -> Result<Arc<dyn AmountSpeller>> {
    Ok(match config.amount_speller {
        SpellerBackend::Rules => Arc::new(RuleAmountSpeller),
        SpellerBackend::Llm => {
            let llm = LlmClient::new(config.anthropic_api_key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(FallbackSpeller::new(Arc::new(LlmAmountSpeller::new(llm))))
        }
    })
}

/// Deletes expired saved jobs periodically, on top of the sweep done on every listing.
fn spawn_job_sweeper(db: PgPool, expiry_hours: i64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(JOB_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let cutoff = expiry_cutoff(Utc::now(), expiry_hours);
            match sweep_expired_jobs(&db, cutoff).await {
                Ok(0) => {}
                Ok(n) => info!("Background sweep removed {n} expired job(s)"),
                Err(e) => warn!("Background job sweep failed: {e}"),
            }
        }
    });
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "kitolto-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by subdomain.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
