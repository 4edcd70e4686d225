use std::net::SocketAddr;
use std::sync::Arc;

/// Default UDP payload size when the client sent no EDNS0 OPT record.
pub const DEFAULT_UDP_PAYLOAD: u16 = 512;

#[derive(Debug, Clone)]
pub struct ProofQuery {
    /// Fully-qualified question name as received, trailing dot included.
    pub name: Arc<str>,
    pub source: SocketAddr,
    /// Largest reply the client accepts (EDNS0 payload size).
    pub max_payload: u16,
}

impl ProofQuery {
    pub fn new(name: impl Into<Arc<str>>, source: SocketAddr, max_payload: u16) -> Self {
        Self {
            name: name.into(),
            source,
            max_payload: max_payload.max(DEFAULT_UDP_PAYLOAD),
        }
    }
}
