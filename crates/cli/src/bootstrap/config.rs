use anyhow::Context;
use ferrous_split_domain::{Config, Overrides};
use tracing::warn;

pub fn load_config(path: &str, overrides: Overrides) -> anyhow::Result<Config> {
    Config::load(path, overrides)
        .with_context(|| format!("Failed to load configuration from {}", path))
}

/// Listeners and the log filter are set up once at startup; changes to them
/// only take effect after a restart.
pub fn warn_on_static_changes(running: &Config, reloaded: &Config) {
    if running.bind_address != reloaded.bind_address {
        warn!(
            running = %running.bind_address,
            reloaded = %reloaded.bind_address,
            "BindAddress changed, restart to apply"
        );
    }
    if running.logging != reloaded.logging {
        warn!(
            running = %running.logging.level,
            reloaded = %reloaded.logging.level,
            "LogLevel changed, restart to apply"
        );
    }
}
