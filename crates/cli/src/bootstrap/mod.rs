mod config;
mod logging;

pub use config::{load_config, warn_on_static_changes};
pub use logging::init_logging;
