mod config;
mod server;
mod storage;

pub use self::config::Config;
pub use server::ServerConfig;
pub use storage::{MongoConfig, RedisConfig};
