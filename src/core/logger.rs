use log::LevelFilter;

/// Installs the process logger. `RUST_LOG` takes precedence over `level`.
pub fn setup_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}
