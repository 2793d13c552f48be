/// Configuration management for Geo Message Service
///
/// All settings come from environment variables (a `.env` file is loaded by
/// `main` first). Invalid values fail startup instead of falling back.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Store configuration
    pub database: DatabaseConfig,
    /// Geo retrieval tuning
    pub retrieval: RetrievalConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Actix worker threads
    pub workers: usize,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

/// Which coordinate is pushed to the store as the range predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushStrategy {
    /// Always push latitude
    Latitude,
    /// Push whichever dimension covers the smaller share of its domain
    Tightest,
}

/// Geo retrieval tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Page size multiplier over `max_records`
    pub overfetch_factor: usize,
    /// Upper bound on rows requested from the store per page
    pub max_page_size: usize,
    /// Largest accepted `max_records`
    pub max_records_ceiling: usize,
    pub push_strategy: PushStrategy,
    /// Deadline for a whole retrieval, in milliseconds
    pub store_timeout_ms: u64,
    /// Answer validation failures with 200 + plain text instead of 400
    pub legacy_inband_errors: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: 4,
            max_page_size: 1_000,
            max_records_ceiling: 500,
            push_strategy: PushStrategy::Latitude,
            store_timeout_ms: 5_000,
            legacy_inband_errors: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if is_production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:3000".to_string(),
            };

            if is_production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let backend = match std::env::var("STORE_BACKEND") {
            Ok(raw) => parse_backend(&raw)?,
            Err(_) => StoreBackend::Postgres,
        };
        if is_production && backend == StoreBackend::Memory {
            return Err("STORE_BACKEND=memory is not allowed in production".to_string());
        }

        let retrieval = RetrievalConfig {
            overfetch_factor: parse_env_or_default("GEO_OVERFETCH_FACTOR", 4)?,
            max_page_size: parse_env_or_default("GEO_MAX_PAGE_SIZE", 1_000)?,
            max_records_ceiling: parse_env_or_default("GEO_MAX_RECORDS_CEILING", 500)?,
            push_strategy: match std::env::var("GEO_PUSH_STRATEGY") {
                Ok(raw) => parse_push_strategy(&raw)?,
                Err(_) => PushStrategy::Latitude,
            },
            store_timeout_ms: parse_env_or_default("GEO_STORE_TIMEOUT_MS", 5_000)?,
            legacy_inband_errors: parse_env_or_default("MESSAGES_LEGACY_INBAND_ERRORS", false)?,
        };
        retrieval.validate()?;

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("GEO_MESSAGE_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("GEO_MESSAGE_SERVICE_PORT", 8090)?,
                workers: parse_env_or_default("HTTP_WORKERS", 4)?,
            },
            cors,
            database: DatabaseConfig {
                backend,
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/magikarp".to_string()),
                max_connections: parse_env_or_default("DB_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env_or_default("DB_MIN_CONNECTIONS", 1)?,
                acquire_timeout_secs: parse_env_or_default("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
                run_migrations: parse_env_or_default("DB_RUN_MIGRATIONS", true)?,
            },
            retrieval,
        })
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.overfetch_factor == 0 {
            return Err("GEO_OVERFETCH_FACTOR must be at least 1".to_string());
        }
        if self.max_records_ceiling == 0 {
            return Err("GEO_MAX_RECORDS_CEILING must be at least 1".to_string());
        }
        if self.max_page_size < self.max_records_ceiling {
            return Err(format!(
                "GEO_MAX_PAGE_SIZE ({}) must be >= GEO_MAX_RECORDS_CEILING ({})",
                self.max_page_size, self.max_records_ceiling
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err("GEO_STORE_TIMEOUT_MS must be positive".to_string());
        }
        Ok(())
    }
}

fn parse_backend(raw: &str) -> Result<StoreBackend, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
        "memory" => Ok(StoreBackend::Memory),
        other => Err(format!(
            "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
            other
        )),
    }
}

fn parse_push_strategy(raw: &str) -> Result<PushStrategy, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "latitude" => Ok(PushStrategy::Latitude),
        "tightest" => Ok(PushStrategy::Tightest),
        other => Err(format!(
            "GEO_PUSH_STRATEGY must be 'latitude' or 'tightest', got '{}'",
            other
        )),
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retrieval_config_is_valid() {
        assert!(RetrievalConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_overfetch() {
        let cfg = RetrievalConfig {
            overfetch_factor: 0,
            ..RetrievalConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_page_size_below_ceiling() {
        let cfg = RetrievalConfig {
            max_page_size: 10,
            max_records_ceiling: 20,
            ..RetrievalConfig::default()
        };
        assert!(cfg.validate().unwrap_err().contains("GEO_MAX_PAGE_SIZE"));
    }

    #[test]
    fn parses_strategy_and_backend_case_insensitively() {
        assert_eq!(parse_push_strategy("Tightest"), Ok(PushStrategy::Tightest));
        assert_eq!(parse_backend(" MEMORY "), Ok(StoreBackend::Memory));
        assert!(parse_backend("firestore").is_err());
    }

    #[test]
    fn redacts_database_url() {
        let cfg = DatabaseConfig {
            backend: StoreBackend::Postgres,
            url: "postgres://user:secret@db/app".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 5,
            run_migrations: true,
        };
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
