pub mod errors;
pub mod keys;
pub mod logging;
pub mod mapserver;
pub mod root;
pub mod server;

pub use errors::ConfigError;
pub use keys::MapPublicKey;
pub use logging::LoggingConfig;
pub use mapserver::{MapserverConfig, MapserverSettings, DEFAULT_TREE_NONCE};
pub use root::{CliOverrides, Config};
pub use server::{FailurePolicy, ServerConfig};
