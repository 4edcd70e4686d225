//! Mapserver DNS Domain Layer
pub mod codec;
pub mod config;
pub mod errors;
pub mod merkle;
pub mod proof;
pub mod proof_query;
pub mod query_name;
pub mod txt_encoding;

pub use config::{CliOverrides, Config, ConfigError, FailurePolicy, MapserverSettings};
pub use errors::{
    CodecError, DomainError, EncodingError, ProofBinding, RetrievalError, ValidationError,
};
pub use proof::{MapLeaf, MapProof, SignedMapRoot};
pub use proof_query::ProofQuery;
pub use query_name::extract_subdomain;
