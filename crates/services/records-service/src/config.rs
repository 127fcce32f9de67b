//! Records service configuration.

use std::env;

use common::{DatabaseConfig, KdfConfig, ServiceConfig};

/// Records service configuration.
#[derive(Debug, Clone, Default)]
pub struct RecordsServiceConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub kdf: KdfConfig,
}

/// Read `RECORDS_<name>`, falling back to the unprefixed `<name>`.
fn var(name: &str) -> Option<String> {
    env::var(format!("RECORDS_{}", name))
        .or_else(|_| env::var(name))
        .ok()
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    var(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl RecordsServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            service: ServiceConfig {
                service_name: defaults.service.service_name,
                log_level: var("LOG_LEVEL").unwrap_or(defaults.service.log_level),
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parsed("DATABASE_MAX_CONNECTIONS", defaults.database.max_connections),
                min_connections: parsed("DATABASE_MIN_CONNECTIONS", defaults.database.min_connections),
                connect_timeout_ms: parsed("DATABASE_CONNECT_TIMEOUT_MS", defaults.database.connect_timeout_ms),
                store_timeout_ms: parsed("STORE_TIMEOUT_MS", defaults.database.store_timeout_ms),
            },
            kdf: KdfConfig {
                memory_kib: parsed("KDF_MEMORY_KIB", defaults.kdf.memory_kib),
                iterations: parsed("KDF_ITERATIONS", defaults.kdf.iterations),
                parallelism: parsed("KDF_PARALLELISM", defaults.kdf.parallelism),
            },
        }
    }

    /// In-memory SQLite with a cheap work factor, for tests and local runs.
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;
        config.database.min_connections = 1;
        config.kdf = KdfConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_uses_single_sqlite_connection() {
        let config = RecordsServiceConfig::in_memory();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 1);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(
            config.database.store_timeout(),
            RecordsServiceConfig::default().database.store_timeout()
        );
    }

    #[test]
    fn test_missing_value_falls_back_to_default() {
        assert_eq!(parsed("RECORDS_TEST_UNSET_VARIABLE", 42u32), 42);
    }
}
