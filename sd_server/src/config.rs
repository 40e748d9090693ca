//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use sports_day::db::DatabaseConfig;
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Extra CORS origin for the admin frontend
    pub frontend_url: Option<String>,
    /// Standalone Prometheus listener, in addition to `/metrics`
    pub metrics_bind: Option<SocketAddr>,
    /// Apply embedded migrations before serving
    pub run_migrations: bool,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// Shared admin password (required)
    pub admin_password: String,
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Admin token lifetime in hours
    pub token_ttl_hours: i64,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("admin_password", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

/// Command line overrides
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub migrate: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env_addr("SERVER_BIND")?.unwrap_or(SocketAddr::from(([127, 0, 0, 1], 5000))),
        };

        let defaults = DatabaseConfig::development();
        let database_url = overrides
            .database_url
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or(defaults.database_url);

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            )?,
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs)?,
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs)?,
            lock_timeout_ms: parse_env_or("DB_LOCK_TIMEOUT_MS", defaults.lock_timeout_ms)?,
            transaction_timeout_secs: parse_env_or(
                "DB_TRANSACTION_TIMEOUT_SECS",
                defaults.transaction_timeout_secs,
            )?,
        };

        // Security configuration (REQUIRED)
        let admin_password =
            std::env::var("ADMIN_PASSWORD").map_err(|_| ConfigError::MissingRequired {
                var: "ADMIN_PASSWORD".to_string(),
                hint: "Set the password sports day admins log in with".to_string(),
            })?;

        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let security = SecurityConfig {
            admin_password,
            jwt_secret,
            token_ttl_hours: parse_env_or("ADMIN_TOKEN_TTL_HOURS", 24)?,
        };

        let config = ServerConfig {
            bind,
            database,
            security,
            frontend_url: std::env::var("FRONTEND_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            metrics_bind: parse_env_addr("METRICS_BIND")?,
            run_migrations: parse_env_or("RUN_MIGRATIONS", false)? || overrides.migrate,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.admin_password.len() < 8 {
            return Err(ConfigError::Invalid {
                var: "ADMIN_PASSWORD".to_string(),
                reason: "Must be at least 8 characters".to_string(),
            });
        }

        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self.security.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "ADMIN_TOKEN_TTL_HOURS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.database.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_LOCK_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        // A transaction must outlive at least one full lock wait.
        if self.database.transaction_timeout_secs.saturating_mul(1000) <= self.database.lock_timeout_ms {
            return Err(ConfigError::Invalid {
                var: "DB_TRANSACTION_TIMEOUT_SECS".to_string(),
                reason: format!(
                    "Must be longer than the lock timeout ({} ms)",
                    self.database.lock_timeout_ms
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    parse_value(key, std::env::var(key).ok(), default)
}

/// A malformed value is an error rather than a silent default.
fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}' is not a valid value"),
        }),
        None => Ok(default),
    }
}

/// An unset address is `None`; a malformed one is an error.
fn parse_env_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}' is not an IP:PORT address"),
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:5000".parse().unwrap(),
            database: DatabaseConfig {
                database_url: "test".to_string(),
                ..DatabaseConfig::development()
            },
            security: SecurityConfig {
                admin_password: "sportsday".to_string(),
                jwt_secret: "a".repeat(32),
                token_ttl_hours: 24,
            },
            frontend_url: None,
            metrics_bind: None,
            run_migrations: false,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_admin_password_rejected() {
        let mut config = valid_config();
        config.security.admin_password = "short".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "ADMIN_PASSWORD"));
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = valid_config();
        config.security.jwt_secret = "a".repeat(31);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_pool_bounds_validated() {
        let mut config = valid_config();
        config.database.min_connections = 50;
        config.database.max_connections = 10;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_MIN_CONNECTIONS"));
    }

    #[test]
    fn test_transaction_must_outlive_lock_wait() {
        let mut config = valid_config();
        config.database.lock_timeout_ms = 20_000;
        config.database.transaction_timeout_secs = 15;

        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_TRANSACTION_TIMEOUT_SECS")
        );
    }

    #[test]
    fn test_unset_value_uses_default() {
        assert_eq!(parse_value::<u64>("DB_LOCK_TIMEOUT_MS", None, 5000).unwrap(), 5000);
    }

    #[test]
    fn test_set_value_parsed() {
        let value = parse_value::<u32>("DB_MAX_CONNECTIONS", Some(" 40 ".to_string()), 20).unwrap();
        assert_eq!(value, 40);
        assert!(parse_value("RUN_MIGRATIONS", Some("true".to_string()), false).unwrap());
    }

    #[test]
    fn test_malformed_value_rejected() {
        let err = parse_value::<u64>("DB_LOCK_TIMEOUT_MS", Some("abc".to_string()), 5000).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_LOCK_TIMEOUT_MS"));

        let err = parse_value("RUN_MIGRATIONS", Some("yes".to_string()), false).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "RUN_MIGRATIONS"));
    }

    #[test]
    fn test_security_config_debug_redacts_secrets() {
        let rendered = format!("{:?}", valid_config().security);
        assert!(!rendered.contains("sportsday"));
        assert!(rendered.contains("redacted"));
    }
}
