use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: tracing::Level,

    /// Seconds a cached token version is trusted before re-reading it
    pub token_version_cache_ttl: u64,

    /// Created as admin at startup when no admin exists yet
    pub bootstrap_admin: Option<(String, String)>,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", 86_400)?, // default 1 day
            db_max_connections: or_default("DB_MAX_CONNECTIONS", 10)?,

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", 30)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: or_default("LOG_LEVEL", tracing::Level::DEBUG)?,

            token_version_cache_ttl: or_default("TOKEN_VERSION_CACHE_TTL", 300)?,

            bootstrap_admin: match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
                (Ok(username), Ok(password)) => Some((username, password)),
                _ => None,
            },
        })
    }

    /// Config for tests and tools that never touch the environment.
    pub fn for_secret(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: jwt_secret.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 3600,
            db_max_connections: 1,
            rate_login_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
            token_version_cache_ttl: 300,
            bootstrap_admin: None,
        }
    }
}
