use clap::Parser;
use log::kv::{ToValue, Value};

#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
pub struct CliArgs {
    /// Path to a TOML config file.
    #[arg(short, long)]
    pub config: Option<String>,
    /// Overrides `server.port`.
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Serve from in-memory stores instead of Redis and MongoDB.
    #[arg(long)]
    pub memory: bool,
}

impl ToValue for CliArgs {
    fn to_value(&self) -> Value<'_> {
        Value::from_debug(self)
    }
}
