use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    /// Bound on every outbound store call made while serving a request.
    #[serde(
        with = "humantime_serde",
        default = "ServerConfig::default_request_timeout"
    )]
    pub request_timeout: Duration,
    #[serde(
        with = "humantime_serde",
        default = "ServerConfig::default_shutdown_timeout"
    )]
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    fn default_port() -> u16 {
        8080
    }

    fn default_host() -> String {
        String::from("0.0.0.0")
    }

    fn default_request_timeout() -> Duration {
        Duration::from_secs(10)
    }

    fn default_shutdown_timeout() -> Duration {
        Duration::from_secs(10)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout: Self::default_request_timeout(),
            shutdown_timeout: Self::default_shutdown_timeout(),
        }
    }
}
