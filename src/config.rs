use std::env;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_MIGRATIONS_PATH: &str = "./migrations";

/// Read and parse an environment variable, falling back when absent or malformed
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub log_level: String,
    pub environment: String,
    /// Owner of the default groups created at start-up
    pub bootstrap_owner_id: Option<Uuid>,
    pub migrations_path: String,
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable is required")?;

        let max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10u32);
        let acquire_timeout_secs = parse_env("DATABASE_ACQUIRE_TIMEOUT_SECS", 30u64);
        let idle_timeout_secs = parse_env("DATABASE_IDLE_TIMEOUT_SECS", 600u64);
        let max_lifetime_secs = parse_env("DATABASE_MAX_LIFETIME_SECS", 1800u64);
        let test_before_acquire = parse_env("DATABASE_TEST_BEFORE_ACQUIRE", true);

        // Validate configuration
        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
        })
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/hundi".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string());

        let environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        let bootstrap_owner_id = match env::var("BOOTSTRAP_OWNER_ID") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                Uuid::parse_str(raw.trim())
                    .map_err(|e| format!("Invalid BOOTSTRAP_OWNER_ID: {}", e))?,
            ),
            _ => None,
        };

        let migrations_path =
            env::var("MIGRATIONS_PATH").unwrap_or_else(|_| DEFAULT_MIGRATIONS_PATH.to_string());

        Ok(Self {
            database,
            log_level: log_level.to_lowercase(),
            environment: environment.to_lowercase(),
            bootstrap_owner_id,
            migrations_path,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Get database URL (convenience method)
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            log_level: "info".to_string(),
            environment: "development".to_string(),
            bootstrap_owner_id: None,
            migrations_path: DEFAULT_MIGRATIONS_PATH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.migrations_path, "./migrations");
        assert!(config.bootstrap_owner_id.is_none());
        assert!(config.is_development());
        assert!(!config.is_production());
    }

    #[test]
    fn test_database_config_durations() {
        let config = DatabaseConfig {
            acquire_timeout_secs: 5,
            ..Default::default()
        };
        assert_eq!(config.acquire_timeout(), Duration::from_secs(5));
        assert_eq!(config.idle_timeout(), Duration::from_secs(600));
        assert_eq!(config.max_lifetime(), Duration::from_secs(1800));
    }
}

