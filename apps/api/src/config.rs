use anyhow::{Context, Result};

const MIB: usize = 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    /// Base of the durable URL handed back after an upload.
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub auth_url: String,
    pub auth_api_key: String,
    pub resume_parser_url: String,
    /// Resume size limit on the onboarding screens.
    pub onboarding_resume_max_bytes: usize,
    /// Resume size limit on the profile-edit screen.
    pub profile_resume_max_bytes: usize,
    pub resume_link_ttl_secs: u64,
    pub profile_cache_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_bucket = require_env("S3_BUCKET")?;
        let s3_endpoint = require_env("S3_ENDPOINT")?;
        let s3_public_url = std::env::var("S3_PUBLIC_URL")
            .unwrap_or_else(|_| format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket));

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket,
            s3_endpoint,
            s3_public_url,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            auth_url: require_env("AUTH_URL")?,
            auth_api_key: require_env("AUTH_API_KEY")?,
            resume_parser_url: require_env("RESUME_PARSER_URL")?,
            onboarding_resume_max_bytes: parse_env("ONBOARDING_RESUME_MAX_BYTES", 10 * MIB)?,
            profile_resume_max_bytes: parse_env("PROFILE_RESUME_MAX_BYTES", 5 * MIB)?,
            resume_link_ttl_secs: parse_env("RESUME_LINK_TTL_SECS", 3600)?,
            profile_cache_ttl_secs: parse_env("PROFILE_CACHE_TTL_SECS", 300)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// The largest request body any upload route must accept.
    pub fn max_upload_body_bytes(&self) -> usize {
        // multipart framing overhead on top of the file itself
        self.onboarding_resume_max_bytes
            .max(self.profile_resume_max_bytes)
            + 64 * 1024
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/hireboard_test".to_string(),
        redis_url: "redis://localhost".to_string(),
        s3_bucket: "resumes".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        s3_public_url: "http://localhost:9000/resumes".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        auth_url: "http://localhost:9999/auth/v1".to_string(),
        auth_api_key: "anon".to_string(),
        resume_parser_url: "http://localhost:9999/functions/v1/parse-resume".to_string(),
        onboarding_resume_max_bytes: 10 * MIB,
        profile_resume_max_bytes: 5 * MIB,
        resume_link_ttl_secs: 3600,
        profile_cache_ttl_secs: 300,
        port: 8080,
        rust_log: "debug".to_string(),
    }
}
