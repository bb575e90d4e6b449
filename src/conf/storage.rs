use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RedisConfig {
    #[serde(default = "RedisConfig::default_url")]
    pub url: String,
}

impl RedisConfig {
    fn default_url() -> String {
        String::from("redis://127.0.0.1:6379")
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
        }
    }
}

/// Location of the collection holding the count observations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MongoConfig {
    #[serde(default = "MongoConfig::default_uri")]
    pub uri: String,
    #[serde(default = "MongoConfig::default_database")]
    pub database: String,
    #[serde(default = "MongoConfig::default_collection")]
    pub collection: String,
}

impl MongoConfig {
    fn default_uri() -> String {
        String::from("mongodb://127.0.0.1:27017")
    }

    fn default_database() -> String {
        String::from("tally")
    }

    fn default_collection() -> String {
        String::from("records")
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
            database: Self::default_database(),
            collection: Self::default_collection(),
        }
    }
}
