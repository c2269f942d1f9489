use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_idle: u32,
    pub jwt_secret: String,
    pub access_ttl_secs: usize,
    pub refresh_ttl_secs: usize,
    pub email_ttl_secs: usize,
    pub admin_email: String,
    pub admin_username: String,
    pub admin_password: String,
    pub log_level: String,
}

const DEFAULT_ACCESS_TTL_SECS: usize = 15 * 60;
const DEFAULT_REFRESH_TTL_SECS: usize = 7 * 24 * 60 * 60;
const DEFAULT_EMAIL_TTL_SECS: usize = 24 * 60 * 60;

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env if present
        let _ = dotenvy::dotenv();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid u16")?;
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite::memory:".to_string());
        let db_max_connections = env_u32("DB_MAX_CONNECTIONS", 10)?;
        let db_min_idle = env_u32("DB_MIN_IDLE", 1)?;
        let log_level =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".to_string());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(val) => val,
            Err(_) if cfg!(debug_assertions) => "super-secret-change-me".to_string(),
            Err(err) => {
                Err(anyhow::anyhow!(err)).context("JWT_SECRET is required in release builds")?
            }
        };

        let access_ttl_secs = env_usize("ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_ttl_secs = env_usize("REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?;
        let email_ttl_secs = env_usize("EMAIL_TTL_SECS", DEFAULT_EMAIL_TTL_SECS)?;

        let admin_email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
        let admin_username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "adminpassword".to_string());

        Ok(Self {
            host,
            port,
            database_url,
            db_max_connections,
            db_min_idle,
            jwt_secret,
            access_ttl_secs,
            refresh_ttl_secs,
            email_ttl_secs,
            admin_email,
            admin_username,
            admin_password,
            log_level,
        })
    }
}

fn env_u32(key: &str, default: u32) -> Result<u32> {
    match std::env::var(key) {
        Ok(val) => val
            .parse::<u32>()
            .with_context(|| format!("{key} must be a valid u32")),
        Err(_) => Ok(default),
    }
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(val) => val
            .parse::<usize>()
            .with_context(|| format!("{key} must be a valid usize")),
        Err(_) => Ok(default),
    }
}
