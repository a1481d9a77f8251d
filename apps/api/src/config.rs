use anyhow::{Context, Result};

/// Credentials for an S3-compatible bucket (AWS or MinIO).
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Sessions live in process memory when unset.
    pub redis_url: Option<String>,
    pub anthropic_api_key: String,
    pub classifier_url: String,
    /// When unset, artifacts are written under `reports_dir`.
    pub s3: Option<S3Config>,
    pub reports_dir: String,
    pub session_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: std::env::var("REDIS_URL").ok(),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            classifier_url: require_env("CLASSIFIER_URL")?,
            s3: s3_from_env()?,
            reports_dir: std::env::var("REPORTS_DIR").unwrap_or_else(|_| "reports".to_string()),
            session_ttl_secs: std::env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse::<u64>()
                .context("SESSION_TTL_SECS must be a whole number of seconds")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// S3 is enabled by `S3_BUCKET`; the rest of the group is then required.
fn s3_from_env() -> Result<Option<S3Config>> {
    let Ok(bucket) = std::env::var("S3_BUCKET") else {
        return Ok(None);
    };
    Ok(Some(S3Config {
        bucket,
        endpoint: require_env("S3_ENDPOINT")?,
        access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
        secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
    }))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
