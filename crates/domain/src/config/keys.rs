use super::errors::ConfigError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;
use std::path::Path;

pub const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// DER SubjectPublicKeyInfo header for an Ed25519 key (RFC 8410).
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

const FILE_REFERENCE_PREFIX: &str = "file:";

/// Ed25519 key the map server signs its roots with.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MapPublicKey([u8; ED25519_PUBLIC_KEY_LEN]);

impl MapPublicKey {
    pub fn from_bytes(bytes: [u8; ED25519_PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ED25519_PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Resolves a configured key: `file:<path>` or an existing path is read
    /// from disk, anything else is parsed inline.
    pub fn load(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();
        let path = value.strip_prefix(FILE_REFERENCE_PREFIX).map(Path::new);

        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(value).is_file() => Self::from_file(Path::new(value)),
            None => Self::parse(value),
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Self::parse(&contents)
    }

    /// Accepts base64 of the raw 32-byte key, base64 of the DER
    /// SubjectPublicKeyInfo, or a PEM `PUBLIC KEY` block.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim();
        let encoded: String = if text.starts_with("-----BEGIN") {
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with("-----"))
                .collect()
        } else {
            text.to_string()
        };

        let der = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| ConfigError::PublicKey(format!("not valid base64: {}", e)))?;

        let raw = match der.len() {
            ED25519_PUBLIC_KEY_LEN => der.as_slice(),
            n if n == ED25519_SPKI_PREFIX.len() + ED25519_PUBLIC_KEY_LEN
                && der.starts_with(&ED25519_SPKI_PREFIX) =>
            {
                &der[ED25519_SPKI_PREFIX.len()..]
            }
            n => {
                return Err(ConfigError::PublicKey(format!(
                    "expected an Ed25519 key, got {} bytes",
                    n
                )))
            }
        };

        let mut key = [0u8; ED25519_PUBLIC_KEY_LEN];
        key.copy_from_slice(raw);
        Ok(Self(key))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for MapPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapPublicKey({})", self.to_base64())
    }
}

impl fmt::Display for MapPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}
