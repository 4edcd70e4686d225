use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid DNS query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Proof retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Proof validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Proof encoding failed: {0}")]
    Encoding(#[from] EncodingError),
}

impl From<ConfigError> for DomainError {
    fn from(value: ConfigError) -> Self {
        DomainError::ConfigError(value.to_string())
    }
}

/// Failures talking to the map server. None of these are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("No domains requested")]
    NoDomains,

    #[error("Failed to connect to map server {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("Timeout talking to map server {address} during {step}")]
    Timeout { address: String, step: &'static str },

    #[error("I/O error talking to map server {address}: {reason}")]
    Io { address: String, reason: String },

    #[error("Map server returned an error: {0}")]
    Server(String),

    #[error("Map server returned {received} proofs for {requested} domains")]
    Incomplete { requested: usize, received: usize },

    #[error("Map server message of {size} bytes exceeds limit of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Malformed map server message: {0}")]
    Protocol(String),

    #[error("Malformed proof from map server: {0}")]
    Decode(#[from] CodecError),
}

/// The three independent bindings a proof must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofBinding {
    /// Leaf commits to the queried domain.
    Domain,
    /// Leaf commits to the configured tree nonce.
    Nonce,
    /// Leaf and audit path recompute the signed root of the expected tree.
    Root,
}

impl ProofBinding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Nonce => "nonce",
            Self::Root => "root",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("proof for '{expected}' commits to domain '{actual}'")]
    DomainMismatch { expected: String, actual: String },

    #[error("proof for '{domain}' is not bound to the configured tree nonce")]
    NonceMismatch { domain: String },

    #[error("proof for '{domain}' does not match the map root: {reason}")]
    RootMismatch { domain: String, reason: String },

    #[error("proof for '{domain}' is malformed: {reason}")]
    Malformed { domain: String, reason: String },
}

impl ValidationError {
    /// Which binding failed. Structural defects count against the root binding,
    /// since such a proof cannot authenticate any root.
    pub fn binding(&self) -> ProofBinding {
        match self {
            Self::DomainMismatch { .. } => ProofBinding::Domain,
            Self::NonceMismatch { .. } => ProofBinding::Nonce,
            Self::RootMismatch { .. } | Self::Malformed { .. } => ProofBinding::Root,
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            Self::DomainMismatch { expected, .. } => expected,
            Self::NonceMismatch { domain }
            | Self::RootMismatch { domain, .. }
            | Self::Malformed { domain, .. } => domain,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("validated proof serialized to zero bytes")]
    EmptyProof,

    #[error("invalid escape in TXT string {index}: {reason}")]
    InvalidEscape { index: usize, reason: String },

    #[error("reply of {size} bytes exceeds the {max} byte DNS message limit")]
    ReplyTooLarge { size: usize, max: usize },

    #[error("failed to serialize DNS reply: {0}")]
    Serialize(String),
}

/// Errors decoding the canonical binary forms exchanged with the map server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("truncated input while reading {0}")]
    Truncated(&'static str),

    #[error("unsupported encoding version {0}")]
    UnsupportedVersion(u8),

    #[error("{0} trailing bytes after proof")]
    TrailingBytes(usize),

    #[error("field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("field {field} is {len} bytes, over its length prefix")]
    FieldTooLong { field: &'static str, len: usize },

    #[error("audit path of {0} siblings exceeds maximum depth")]
    PathTooLong(usize),
}
