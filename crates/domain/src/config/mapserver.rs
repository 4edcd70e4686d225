use super::errors::ConfigError;
use super::keys::MapPublicKey;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Nonce bound into leaves when the configuration names none.
pub const DEFAULT_TREE_NONCE: &[u8] = b"mapserver-dns/default-tree-nonce/v1";

/// `[mapserver]` section as written in the config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MapserverConfig {
    /// Zone this server answers for, e.g. `example.com.`
    pub base_zone: String,

    #[serde(default)]
    pub map_tree_id: Option<i64>,

    /// File whose content is the tree id; used when `map_tree_id` is unset.
    #[serde(default)]
    pub map_tree_id_file: Option<String>,

    /// Inline key, PEM block, `file:<path>`, or a path.
    pub map_public_key: String,

    /// `host:port`, optionally prefixed with `tcp://`.
    pub map_address: String,

    #[serde(default = "default_max_receive_message_size")]
    pub max_receive_message_size: usize,

    /// Base64 nonce; [`DEFAULT_TREE_NONCE`] when unset.
    #[serde(default)]
    pub tree_nonce: Option<String>,

    /// Seconds allowed for each map-server network step.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,
}

fn default_max_receive_message_size() -> usize {
    4 * 1024 * 1024
}

fn default_query_timeout() -> u64 {
    5
}

/// Checked, typed form of [`MapserverConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapserverSettings {
    /// Always dot-terminated.
    pub base_zone: String,
    pub tree_id: i64,
    pub public_key: MapPublicKey,
    /// `host:port`
    pub map_address: String,
    pub max_receive_message_size: usize,
    pub tree_nonce: Vec<u8>,
    pub query_timeout: Duration,
}

impl MapserverConfig {
    pub fn resolve(&self) -> Result<MapserverSettings, ConfigError> {
        let base_zone = self.base_zone.trim();
        if base_zone.is_empty() {
            return Err(ConfigError::Validation(
                "mapserver.base_zone is required".to_string(),
            ));
        }
        let base_zone = if base_zone.ends_with('.') {
            base_zone.to_string()
        } else {
            format!("{}.", base_zone)
        };

        let tree_id = self.resolve_tree_id()?;
        let public_key = MapPublicKey::load(&self.map_public_key)?;
        let map_address = parse_map_address(&self.map_address)?;

        if self.max_receive_message_size == 0 {
            return Err(ConfigError::Validation(
                "mapserver.max_receive_message_size must be positive".to_string(),
            ));
        }

        if self.query_timeout == 0 {
            return Err(ConfigError::Validation(
                "mapserver.query_timeout must be positive".to_string(),
            ));
        }

        let tree_nonce = match &self.tree_nonce {
            Some(encoded) => STANDARD.decode(encoded.trim()).map_err(|e| {
                ConfigError::Validation(format!("mapserver.tree_nonce is not base64: {}", e))
            })?,
            None => DEFAULT_TREE_NONCE.to_vec(),
        };
        if tree_nonce.is_empty() {
            return Err(ConfigError::Validation(
                "mapserver.tree_nonce must not be empty".to_string(),
            ));
        }

        Ok(MapserverSettings {
            base_zone,
            tree_id,
            public_key,
            map_address,
            max_receive_message_size: self.max_receive_message_size,
            tree_nonce,
            query_timeout: Duration::from_secs(self.query_timeout),
        })
    }

    fn resolve_tree_id(&self) -> Result<i64, ConfigError> {
        if let Some(id) = self.map_tree_id {
            return Ok(id);
        }

        let path = self.map_tree_id_file.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "one of mapserver.map_tree_id or mapserver.map_tree_id_file is required"
                    .to_string(),
            )
        })?;

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        contents.trim().parse::<i64>().map_err(|e| {
            ConfigError::Validation(format!("tree id in {} is not an integer: {}", path, e))
        })
    }
}

fn parse_map_address(raw: &str) -> Result<String, ConfigError> {
    let addr = raw.trim();
    let addr = addr.strip_prefix("tcp://").unwrap_or(addr);
    let addr = addr.trim_end_matches('/');

    let (host, port) = addr.rsplit_once(':').ok_or_else(|| {
        ConfigError::Validation(format!("mapserver.map_address '{}' has no port", raw))
    })?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(ConfigError::Validation(format!(
            "mapserver.map_address '{}' has no host",
            raw
        )));
    }
    port.parse::<u16>().map_err(|e| {
        ConfigError::Validation(format!("mapserver.map_address '{}': invalid port: {}", raw, e))
    })?;

    Ok(addr.to_string())
}
