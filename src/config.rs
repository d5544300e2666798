//! Environment-driven configuration shared by the archive service and the
//! seed binary.

use sqlx::ConnectOptions;
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::time::Duration;

/// Port the archive service listens on unless `ROCKET_PORT` overrides it.
pub const LISTEN_PORT: u16 = 3000;

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Fixed pool capacity; requests beyond it wait for a free connection.
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "emails".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            max_connections: 20,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_string("DB_HOST", &defaults.host),
            port: env_u16("DB_PORT", defaults.port),
            database: env_string("DB_NAME", &defaults.database),
            user: env_string("DB_USER", &defaults.user),
            password: env_string("DB_PASSWORD", &defaults.password),
            max_connections: env_u32("DB_MAX_CONNECTIONS", defaults.max_connections),
            connect_timeout: Duration::from_secs(u64::from(env_u32(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout.as_secs() as u32,
            ))),
        }
    }

    /// Connection options with statement logging turned down to `debug`.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
            .log_statements(log::LevelFilter::Debug)
    }

    /// `host:port/database`, safe to log.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}
