use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub feed: FeedConfig,
    pub log_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Node component of generated IDs, must be below 1024
    pub node_id: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entries kept in the auth-token LRU
    pub token_capacity: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 5,
                node_id: 0,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            cache: CacheConfig {
                token_capacity: 1000,
            },
            feed: FeedConfig::default(),
            log_filter: "social_feed=info,tower_http=info".to_string(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {} ({})", key, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let config = Self {
            database: DatabaseConfig {
                url: env_or("DATABASE_URL", defaults.database.url)?,
                max_connections: env_or("DB_MAX_CONNECTIONS", defaults.database.max_connections)?,
                node_id: env_or("NODE_ID", defaults.database.node_id)?,
            },
            server: ServerConfig {
                host: env_or("SERVER_HOST", defaults.server.host)?,
                port: env_or("SERVER_PORT", defaults.server.port)?,
            },
            cache: CacheConfig {
                token_capacity: env_or("TOKEN_CACHE_CAPACITY", defaults.cache.token_capacity)?,
            },
            feed: FeedConfig {
                default_page_size: env_or(
                    "FEED_DEFAULT_PAGE_SIZE",
                    defaults.feed.default_page_size,
                )?,
                max_page_size: env_or("FEED_MAX_PAGE_SIZE", defaults.feed.max_page_size)?,
            },
            log_filter: env_or("RUST_LOG", defaults.log_filter)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.node_id >= 1024 {
            anyhow::bail!("NODE_ID must be less than 1024");
        }
        if self.feed.default_page_size == 0 || self.feed.max_page_size == 0 {
            anyhow::bail!("page sizes must be positive");
        }
        if self.feed.default_page_size > self.feed.max_page_size {
            anyhow::bail!("FEED_DEFAULT_PAGE_SIZE exceeds FEED_MAX_PAGE_SIZE");
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
