use super::response_builder::{ProofResponseBuilder, Transport};
use hickory_proto::op::{Message, MessageType};
use mapserver_dns_application::use_cases::{RequestStage, ServeProofUseCase};
use mapserver_dns_domain::proof_query::DEFAULT_UDP_PAYLOAD;
use mapserver_dns_domain::{DomainError, ProofQuery};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Turns raw DNS queries into proof replies.
///
/// `handle` yields exactly one reply or an error; on error nothing has been
/// written and the caller applies its failure policy.
pub struct DnsServerHandler {
    use_case: Arc<ServeProofUseCase>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<ServeProofUseCase>) -> Self {
        Self { use_case }
    }

    pub async fn handle(
        &self,
        packet: &[u8],
        source: SocketAddr,
        transport: Transport,
    ) -> Result<Vec<u8>, DomainError> {
        let (request, query) = Self::parse_request(packet, source)?;
        debug!(
            qname = %query.name,
            client = %source,
            transport = transport.as_str(),
            stage = ?RequestStage::ReceivedQuery
        );

        let answer = self.use_case.execute(&query).await?;
        let response = ProofResponseBuilder::build(&request, &answer)?;
        let bytes =
            ProofResponseBuilder::encode_for(&request, &response, transport, query.max_payload)?;
        debug!(qname = %query.name, reply_len = bytes.len(), stage = ?RequestStage::ResponseBuilt);

        Ok(bytes)
    }

    /// SERVFAIL for `packet`, or `None` when it is not a parsable query.
    pub fn servfail(packet: &[u8]) -> Option<Vec<u8>> {
        let request = Message::from_vec(packet).ok()?;
        if request.message_type() != MessageType::Query {
            return None;
        }
        ProofResponseBuilder::serialize(&ProofResponseBuilder::servfail(&request)).ok()
    }

    pub fn parse_request(
        packet: &[u8],
        source: SocketAddr,
    ) -> Result<(Message, ProofQuery), DomainError> {
        let request = Message::from_vec(packet).map_err(|e| {
            DomainError::InvalidQuery(format!("Failed to parse DNS query: {}", e))
        })?;

        if request.message_type() != MessageType::Query {
            return Err(DomainError::InvalidQuery(
                "message is a response, not a query".to_string(),
            ));
        }

        let question = request
            .queries()
            .first()
            .ok_or_else(|| DomainError::InvalidQuery("query has no question".to_string()))?;

        let max_payload = request
            .extensions()
            .as_ref()
            .map(|edns| edns.max_payload())
            .unwrap_or(DEFAULT_UDP_PAYLOAD);

        let query = ProofQuery::new(question.name().to_ascii(), source, max_payload);
        Ok((request, query))
    }
}
