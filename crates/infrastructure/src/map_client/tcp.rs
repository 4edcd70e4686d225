use super::protocol::{read_frame, write_frame, FrameError, GetProofForDomains, MapResponse};
use async_trait::async_trait;
use mapserver_dns_application::ports::MapClient;
use mapserver_dns_domain::config::MapPublicKey;
use mapserver_dns_domain::{MapProof, MapserverSettings, RetrievalError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

/// Map client that opens one TCP connection per `retrieve_proofs` call.
pub struct TcpMapClient {
    address: String,
    tree_id: i64,
    public_key: MapPublicKey,
    max_receive_message_size: usize,
    timeout: Duration,
}

impl TcpMapClient {
    pub fn new(
        address: impl Into<String>,
        tree_id: i64,
        public_key: MapPublicKey,
        max_receive_message_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            address: address.into(),
            tree_id,
            public_key,
            max_receive_message_size,
            timeout,
        }
    }

    pub fn from_settings(settings: &MapserverSettings) -> Self {
        Self::new(
            settings.map_address.clone(),
            settings.tree_id,
            settings.public_key,
            settings.max_receive_message_size,
            settings.query_timeout,
        )
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connect(&self) -> Result<TcpStream, RetrievalError> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| self.timed_out("connect"))?
            .map_err(|e| RetrievalError::Connect {
                address: self.address.clone(),
                reason: e.to_string(),
            })?;

        stream.set_nodelay(true).map_err(|e| RetrievalError::Connect {
            address: self.address.clone(),
            reason: format!("failed to set TCP_NODELAY: {}", e),
        })?;

        Ok(stream)
    }

    async fn exchange(
        &self,
        stream: &mut TcpStream,
        request: &[u8],
    ) -> Result<Vec<u8>, RetrievalError> {
        tokio::time::timeout(self.timeout, write_frame(stream, request))
            .await
            .map_err(|_| self.timed_out("write"))?
            .map_err(|e| self.frame_error(e))?;

        debug!(
            server = %self.address,
            request_len = request.len(),
            "Map request sent"
        );

        let payload = tokio::time::timeout(
            self.timeout,
            read_frame(stream, self.max_receive_message_size),
        )
        .await
        .map_err(|_| self.timed_out("read"))?
        .map_err(|e| self.frame_error(e))?;

        debug!(
            server = %self.address,
            response_len = payload.len(),
            "Map response received"
        );

        Ok(payload)
    }

    async fn close(&self, mut stream: TcpStream) {
        match tokio::time::timeout(self.timeout, stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(server = %self.address, error = %e, "Map connection shutdown failed")
            }
            Err(_) => debug!(server = %self.address, "Map connection shutdown timed out"),
        }
    }

    fn timed_out(&self, step: &'static str) -> RetrievalError {
        RetrievalError::Timeout {
            address: self.address.clone(),
            step,
        }
    }

    fn frame_error(&self, error: FrameError) -> RetrievalError {
        match error {
            FrameError::TooLarge { size, max } => RetrievalError::MessageTooLarge { size, max },
            FrameError::Io(e) => RetrievalError::Io {
                address: self.address.clone(),
                reason: e.to_string(),
            },
        }
    }
}

#[async_trait]
impl MapClient for TcpMapClient {
    async fn retrieve_proofs(&self, domains: &[String]) -> Result<Vec<MapProof>, RetrievalError> {
        if domains.is_empty() {
            return Err(RetrievalError::NoDomains);
        }

        let request = GetProofForDomains {
            tree_id: self.tree_id,
            expected_map_public_key: self.public_key.as_bytes().to_vec(),
            domains: domains.to_vec(),
        }
        .encode()?;

        let mut stream = self.connect().await?;
        let exchanged = self.exchange(&mut stream, &request).await;
        self.close(stream).await;

        match MapResponse::decode(&exchanged?)? {
            MapResponse::Error(message) => Err(RetrievalError::Server(message)),
            MapResponse::Proofs(proofs) if proofs.len() < domains.len() => {
                Err(RetrievalError::Incomplete {
                    requested: domains.len(),
                    received: proofs.len(),
                })
            }
            MapResponse::Proofs(proofs) if proofs.len() > domains.len() => {
                Err(RetrievalError::Protocol(format!(
                    "received {} proofs for {} domains",
                    proofs.len(),
                    domains.len()
                )))
            }
            MapResponse::Proofs(proofs) => Ok(proofs),
        }
    }
}
