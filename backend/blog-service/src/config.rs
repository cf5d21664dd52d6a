//! Configuration management for Blog Service
//!
//! Settings come from environment variables, with a `.env` file loaded first
//! for local development. Every value has a development default except
//! `SECRET_KEY`, which must be set when `APP_ENV=production`.
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub email: EmailConfig,
    pub uploads: UploadConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    #[serde(default = "default_app_env")]
    pub env: String,

    #[serde(default = "default_app_host")]
    pub host: String,

    #[serde(default = "default_app_port")]
    pub port: u16,

    /// Absolute base URL used in emailed links. Falls back to the request host.
    #[serde(default)]
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Signing secret for session and password reset tokens
    pub secret_key: String,

    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_secs: i64,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,

    #[serde(default = "default_remember_ttl")]
    pub remember_ttl_secs: i64,

    /// Mark cookies `Secure` (HTTPS only)
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Empty host puts the mailer in no-op mode
    #[serde(default)]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    #[serde(default = "default_smtp_from")]
    pub smtp_from: String,

    #[serde(default = "default_use_starttls")]
    pub use_starttls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory profile pictures are written to
    pub profile_pics_dir: PathBuf,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "127.0.0.1".to_string()
}

fn default_app_port() -> u16 {
    5000
}

fn default_database_url() -> String {
    "sqlite://site.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_reset_token_ttl() -> i64 {
    1800 // 30 minutes
}

fn default_session_ttl() -> i64 {
    86_400 // 1 day
}

fn default_remember_ttl() -> i64 {
    31_536_000 // 365 days
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "noreply@blog.local".to_string()
}

fn default_use_starttls() -> bool {
    true
}

fn default_profile_pics_dir() -> PathBuf {
    PathBuf::from("static/profile_pics")
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_per_page() -> i64 {
    3
}

/// Random per-process secret for development. Sessions do not survive restarts.
fn generate_dev_secret() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| default_app_env());
        let production = app_env.eq_ignore_ascii_case("production");

        let secret_key = match optional_env("SECRET_KEY") {
            Some(secret) => {
                if production && secret.len() < 32 {
                    return Err("SECRET_KEY must be at least 32 characters in production".to_string());
                }
                secret
            }
            None if production => return Err("SECRET_KEY must be set in production".to_string()),
            None => {
                tracing::warn!("SECRET_KEY not set; using a random development secret");
                generate_dev_secret()
            }
        };

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: env::var("APP_HOST").unwrap_or_else(|_| default_app_host()),
                port: parse_env("APP_PORT", default_app_port())?,
                public_url: optional_env("PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| default_database_url()),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", default_db_max_connections())?,
            },
            security: SecurityConfig {
                secret_key,
                reset_token_ttl_secs: parse_env("RESET_TOKEN_TTL_SECS", default_reset_token_ttl())?,
                session_ttl_secs: parse_env("SESSION_TTL_SECS", default_session_ttl())?,
                remember_ttl_secs: parse_env("REMEMBER_TTL_SECS", default_remember_ttl())?,
                secure_cookies: parse_env("SECURE_COOKIES", production)?,
            },
            email: EmailConfig {
                smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
                smtp_port: parse_env("SMTP_PORT", default_smtp_port())?,
                smtp_username: optional_env("SMTP_USERNAME"),
                smtp_password: optional_env("SMTP_PASSWORD"),
                smtp_from: env::var("SMTP_FROM").unwrap_or_else(|_| default_smtp_from()),
                use_starttls: parse_env("SMTP_USE_STARTTLS", default_use_starttls())?,
            },
            uploads: UploadConfig {
                profile_pics_dir: optional_env("PROFILE_PICS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_profile_pics_dir),
                max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", default_max_upload_bytes())?,
            },
            pagination: PaginationConfig {
                per_page: parse_env("POSTS_PER_PAGE", default_per_page())?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                env: default_app_env(),
                host: default_app_host(),
                port: default_app_port(),
                public_url: None,
            },
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: default_db_max_connections(),
            },
            security: SecurityConfig {
                secret_key: generate_dev_secret(),
                reset_token_ttl_secs: default_reset_token_ttl(),
                session_ttl_secs: default_session_ttl(),
                remember_ttl_secs: default_remember_ttl(),
                secure_cookies: false,
            },
            email: EmailConfig {
                smtp_host: String::new(),
                smtp_port: default_smtp_port(),
                smtp_username: None,
                smtp_password: None,
                smtp_from: default_smtp_from(),
                use_starttls: default_use_starttls(),
            },
            uploads: UploadConfig {
                profile_pics_dir: default_profile_pics_dir(),
                max_upload_bytes: default_max_upload_bytes(),
            },
            pagination: PaginationConfig {
                per_page: default_per_page(),
            },
        }
    }
}
