use crate::{
    conf::{MongoConfig, RedisConfig, ServerConfig},
    core::TallyError::{self, ConfigParsingError},
};
use config::{Config as CConfig, ConfigBuilder, Environment, FileFormat, builder::DefaultState};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "TALLY";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub mongo: MongoConfig,
    #[serde(default = "Config::default_log_level")]
    pub log_level: String,
}

impl Config {
    fn default_log_level() -> String {
        String::from("info")
    }

    pub fn from_str(toml_str: &str) -> Result<Config, TallyError> {
        let builder = CConfig::builder()
            .add_source(config::File::from_str(toml_str, FileFormat::Toml));
        Self::finish(builder)
    }

    /// Loads the optional TOML file at `path`, then applies `TALLY_*`
    /// environment overrides (`TALLY_SERVER__PORT=9000`).
    pub fn load(path: Option<&str>) -> Result<Config, TallyError> {
        Self::load_with_env(path, None)
    }

    pub(crate) fn load_with_env(
        path: Option<&str>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Config, TallyError> {
        let mut builder = CConfig::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::new(path, FileFormat::Toml));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Config, TallyError> {
        builder
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter, TallyError> {
        self.log_level.parse::<LevelFilter>().map_err(|_| {
            ConfigParsingError(format!("unknown log level '{}'", self.log_level))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            redis: RedisConfig::default(),
            mongo: MongoConfig::default(),
            log_level: Self::default_log_level(),
        }
    }
}
