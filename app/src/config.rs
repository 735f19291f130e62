use std::collections::HashMap;

use anyhow::{Context, Result};
use err_derive::Error;
use log::*;
use r2d2::Pool;
use serde::Deserialize;

use infra::persistence::{DocumentConnectionManager, MemoryConnectionManager};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub seed: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    Postgres(PostgresConfig),
    Memory,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PostgresConfig {
    pub url: String,
    pub pool_size: Option<u32>,
}

/// Raised by tools that need documents to outlive the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(display = "The memory store starts empty in every process; configure kind = \"postgres\"")]
pub struct EphemeralStore;

/// Values read from `COOKBOOK_*` environment variables, which win over the
/// config file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct EnvOverrides {
    pub listen_addr: Option<std::net::SocketAddr>,
    pub postgres_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Default)]
pub struct EnvLogger {
    level: Option<LogLevel>,
    #[serde(default)]
    modules: HashMap<String, LogLevel>,
    #[serde(default)]
    timestamp_nanos: bool,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self> {
        let env = envy::prefixed("COOKBOOK_")
            .from_env::<EnvOverrides>()
            .context("read COOKBOOK_ environment")?;
        Ok(env)
    }
}

impl Config {
    pub fn apply_env(&mut self, env: &EnvOverrides) {
        if let Some(url) = env.postgres_url.as_ref() {
            debug!("Postgres url from environment");
            match &mut self.store {
                StoreConfig::Postgres(pg) => pg.url = url.clone(),
                StoreConfig::Memory => {
                    warn!("COOKBOOK_POSTGRES_URL set; switching from memory store");
                    self.store = StoreConfig::Postgres(PostgresConfig {
                        url: url.clone(),
                        pool_size: None,
                    });
                }
            }
        }
    }
}

impl StoreConfig {
    /// The postgres settings, or `EphemeralStore` for the memory store.
    pub fn persistent(&self) -> Result<&PostgresConfig> {
        match self {
            StoreConfig::Postgres(pg) => Ok(pg),
            StoreConfig::Memory => Err(EphemeralStore.into()),
        }
    }
}

impl PostgresConfig {
    pub fn build(&self) -> Result<Pool<DocumentConnectionManager>> {
        debug!("Build postgres pool (size: {:?})", self.pool_size);
        let manager = DocumentConnectionManager::new(&self.url)?;

        let mut builder = r2d2::Pool::builder();
        if let Some(size) = self.pool_size {
            builder = builder.max_size(size);
        }

        debug!("Pool builder: {:?}", builder);
        let pool = builder.build(manager).context("build pool")?;

        Ok(pool)
    }
}

pub fn memory_pool() -> Result<Pool<MemoryConnectionManager>> {
    let pool = r2d2::Pool::builder()
        .build(MemoryConnectionManager::new())
        .context("build pool")?;
    Ok(pool)
}

impl LogLevel {
    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl EnvLogger {
    pub fn builder(&self) -> env_logger::Builder {
        let mut b = env_logger::Builder::from_default_env();
        if let Some(level) = self.level {
            b.filter_level(level.to_filter());
        }

        for (module, level) in self.modules.iter() {
            b.filter_module(module, level.to_filter());
        }

        if self.timestamp_nanos {
            b.format_timestamp_nanos();
        }
        b
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_postgres_store() {
        let config: Config = toml::from_str(
            r#"
            seed = true
            [store]
            kind = "postgres"
            url = "postgres://cookbook@localhost/cookbook"
            pool_size = 4
            "#,
        )
        .expect("parse");

        assert_eq!(
            config,
            Config {
                store: StoreConfig::Postgres(PostgresConfig {
                    url: "postgres://cookbook@localhost/cookbook".to_string(),
                    pool_size: Some(4),
                }),
                seed: true,
            }
        );
    }

    #[test]
    fn seeding_defaults_off() {
        let config: Config = toml::from_str(
            r#"
            [store]
            kind = "memory"
            "#,
        )
        .expect("parse");

        assert_eq!(config.store, StoreConfig::Memory);
        assert!(!config.seed);
    }

    #[test]
    fn environment_url_replaces_file_url() {
        let mut config = Config {
            store: StoreConfig::Memory,
            seed: false,
        };
        let env = EnvOverrides {
            listen_addr: None,
            postgres_url: Some("postgres://elsewhere/db".to_string()),
        };

        config.apply_env(&env);

        assert_eq!(
            config.store,
            StoreConfig::Postgres(PostgresConfig {
                url: "postgres://elsewhere/db".to_string(),
                pool_size: None,
            })
        );
    }

    #[test]
    fn reads_logger_section() {
        let logger: EnvLogger = toml::from_str(
            r#"
            level = "info"
            timestamp_nanos = true
            [modules]
            cookbook = "debug"
            "#,
        )
        .expect("parse");

        assert_eq!(logger.level, Some(LogLevel::Info));
        assert_eq!(logger.modules.get("cookbook"), Some(&LogLevel::Debug));
        assert!(logger.timestamp_nanos);
    }

    #[test]
    fn memory_store_is_not_persistent() {
        let err = StoreConfig::Memory.persistent().expect_err("memory store");
        assert_eq!(err.downcast_ref::<EphemeralStore>(), Some(&EphemeralStore));

        let pg = PostgresConfig {
            url: "postgres://localhost/cookbook".to_string(),
            pool_size: None,
        };
        let store = StoreConfig::Postgres(pg.clone());
        assert_eq!(store.persistent().expect("postgres store"), &pg);
    }
}
