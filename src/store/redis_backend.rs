use async_trait::async_trait;
use log::info;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use super::kv::KeyValueBackend;
use crate::conf::RedisConfig;
use crate::core::TallyError;

/// Redis-backed cache. `ConnectionManager` reconnects on its own and is
/// cheap to clone, so each call works on its own handle.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connects and pings the server; fails if Redis is unreachable.
    pub async fn connect(config: &RedisConfig) -> Result<Self, TallyError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| TallyError::ConfigParsingError(format!("invalid Redis url: {e}")))?;
        let mut connection = ConnectionManager::new(client).await.map_err(|e| {
            TallyError::StorageUnavailable(format!("unable to connect to Redis: {e}"))
        })?;

        let pong: String = redis::cmd("PING").query_async(&mut connection).await?;
        info!("Connected to Redis at {} ({})", config.url, pong);

        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyValueBackend for RedisStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), TallyError> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, TallyError> {
        let mut conn = self.connection.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }
}
