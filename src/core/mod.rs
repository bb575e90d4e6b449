mod args;
mod context;
mod error;
mod logger;

pub use args::CliArgs;
pub use context::RequestContext;
pub use error::TallyError;
pub use logger::setup_logging;
