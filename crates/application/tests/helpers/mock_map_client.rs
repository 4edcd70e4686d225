use async_trait::async_trait;
use mapserver_dns_application::ports::MapClient;
use mapserver_dns_domain::{MapProof, RetrievalError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Serves proofs from a map keyed by domain; unknown domains are skipped,
/// which the pipeline sees as an incomplete result.
#[derive(Clone, Default)]
pub struct MockMapClient {
    proofs: Arc<RwLock<HashMap<String, MapProof>>>,
    error: Arc<RwLock<Option<RetrievalError>>>,
    requests: Arc<std::sync::Mutex<Vec<Vec<String>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockMapClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_proof(&self, domain: &str, proof: MapProof) {
        self.proofs.write().await.insert(domain.to_string(), proof);
    }

    pub async fn set_error(&self, error: RetrievalError) {
        *self.error.write().await = Some(error);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_domains(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MapClient for MockMapClient {
    async fn retrieve_proofs(&self, domains: &[String]) -> Result<Vec<MapProof>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(domains.to_vec());

        if let Some(err) = self.error.read().await.clone() {
            return Err(err);
        }

        let proofs = self.proofs.read().await;
        Ok(domains
            .iter()
            .filter_map(|domain| proofs.get(domain).cloned())
            .collect())
    }
}
