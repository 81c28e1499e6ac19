pub mod errors;
pub mod logging;
pub mod root;
pub mod upstream;

pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{Config, Overrides, RawConfig, DEFAULT_NAT64_PREFIX};
pub use upstream::RawUpstream;
