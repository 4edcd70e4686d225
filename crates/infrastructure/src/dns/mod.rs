pub mod response_builder;
pub mod server;

pub use response_builder::{
    ProofResponseBuilder, Transport, EDNS_MAX_PAYLOAD, MAX_TCP_MESSAGE, PROOF_TTL,
};
pub use server::DnsServerHandler;
