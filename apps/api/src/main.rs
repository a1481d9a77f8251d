mod classifier;
mod config;
mod content;
mod db;
mod errors;
mod layout;
mod llm_client;
mod models;
mod narrative;
mod render;
mod routes;
mod session;
mod state;
mod storage;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::classifier::HttpClassifier;
use crate::config::{Config, S3Config};
use crate::db::create_pool;
use crate::layout::LayoutConfig;
use crate::llm_client::LlmClient;
use crate::narrative::LlmNarrator;
use crate::routes::build_router;
use crate::session::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::state::AppState;
use crate::storage::{ArtifactStore, LocalArtifactStore, S3ArtifactStore};
use crate::users::PgUserStore;

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

    info!("Starting Dermalens API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (users and profiles)
    let db = create_pool(&config.database_url).await?;
    let users = Arc::new(PgUserStore::new(db));

    // Redis (session flow state)
    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let redis = redis::Client::open(url.as_str())?;
            info!("Redis session store initialized (ttl {}s)", config.session_ttl_secs);
            Arc::new(RedisSessionStore::new(redis, config.session_ttl_secs))
        }
        None => {
            warn!("REDIS_URL not set; sessions are kept in memory and lost on restart");
            Arc::new(MemorySessionStore::new(config.session_ttl_secs))
        }
    };

    // Uploaded images and reports
    let artifacts: Arc<dyn ArtifactStore> = match &config.s3 {
        Some(s3) => {
            let client = build_s3_client(s3).await;
            info!("Artifacts stored in S3 bucket {}", s3.bucket);
            Arc::new(S3ArtifactStore::new(client, s3.bucket.clone()))
        }
        None => {
            info!("Artifacts stored under ./{}", config.reports_dir);
            Arc::new(LocalArtifactStore::new(&config.reports_dir))
        }
    };

    // Lesion model server
    let classifier = Arc::new(HttpClassifier::new(config.classifier_url.clone())?);
    info!("Classifier endpoint: {}", config.classifier_url);

    // Narrative LLM
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let narrator = Arc::new(LlmNarrator(llm));

    let state = AppState {
        users,
        sessions,
        artifacts,
        classifier,
        narrator,
        layout: LayoutConfig::us_letter(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(s3: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &s3.access_key_id,
        &s3.secret_access_key,
        None,
        None,
        "dermalens-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&s3.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
