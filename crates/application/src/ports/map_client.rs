use async_trait::async_trait;
use mapserver_dns_domain::{MapProof, RetrievalError};

#[async_trait]
pub trait MapClient: Send + Sync {
    /// Fetch one proof per domain, in request order.
    ///
    /// Implementations acquire and release their connection within the call
    /// and never retry. A short proof list is a [`RetrievalError::Incomplete`].
    async fn retrieve_proofs(&self, domains: &[String]) -> Result<Vec<MapProof>, RetrievalError>;
}
