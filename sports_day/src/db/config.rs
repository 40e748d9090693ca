//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// How long a request may wait for a pooled connection, in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,

    /// Row/advisory lock wait bound applied to every transaction, in milliseconds
    pub lock_timeout_ms: u64,

    /// Upper bound for a whole transactional operation, in seconds
    pub transaction_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/college_sports_day` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/college_sports_day".to_string(),
            max_connections: 20,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            lock_timeout_ms: 5000,
            transaction_timeout_secs: 15,
        }
    }

    /// Lock and transaction bounds handed to the managers.
    pub fn lock_settings(&self) -> LockSettings {
        LockSettings {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            transaction_timeout: Duration::from_secs(self.transaction_timeout_secs),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

/// Bounds on how long a transaction may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSettings {
    /// `lock_timeout` set on each transaction
    pub lock_timeout: Duration,
    /// Deadline for the whole operation, connection acquisition included
    pub transaction_timeout: Duration,
}

impl Default for LockSettings {
    fn default() -> Self {
        DatabaseConfig::development().lock_settings()
    }
}
