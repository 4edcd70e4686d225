use crate::ports::MapClient;
use crate::services::ProofValidator;
use mapserver_dns_domain::txt_encoding;
use mapserver_dns_domain::{
    extract_subdomain, DomainError, EncodingError, ProofQuery, RetrievalError,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Progress of one query through the proof pipeline. `Errored` is reachable
/// from every stage after `ReceivedQuery`; nothing is sent from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    ReceivedQuery,
    DomainExtracted,
    ProofsRetrieved,
    ProofValidated,
    ResponseBuilt,
    Sent,
    Errored,
}

impl RequestStage {
    /// Last stage completed before `error` aborted the request.
    pub fn reached_before(error: &DomainError) -> Self {
        match error {
            DomainError::InvalidQuery(_) | DomainError::ConfigError(_) => Self::ReceivedQuery,
            DomainError::Retrieval(_) => Self::DomainExtracted,
            DomainError::Validation(_) => Self::ProofsRetrieved,
            DomainError::Encoding(_) => Self::ProofValidated,
        }
    }
}

/// Encoded proof ready to be attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofAnswer {
    pub domain: String,
    /// `\DDD`-escaped character-strings, 255 proof bytes each.
    pub txt: Vec<String>,
    pub proof_len: usize,
    pub revision: u64,
}

pub struct ServeProofUseCase {
    map_client: Arc<dyn MapClient>,
    validator: ProofValidator,
    base_zone: String,
}

impl ServeProofUseCase {
    pub fn new(
        map_client: Arc<dyn MapClient>,
        validator: ProofValidator,
        base_zone: impl Into<String>,
    ) -> Self {
        Self {
            map_client,
            validator,
            base_zone: base_zone.into(),
        }
    }

    pub fn base_zone(&self) -> &str {
        &self.base_zone
    }

    /// Runs extract → retrieve → validate → encode. Any failure aborts the
    /// request; the caller decides whether and how to answer.
    pub async fn execute(&self, query: &ProofQuery) -> Result<ProofAnswer, DomainError> {
        let start = Instant::now();
        let result = self.run(query).await;

        match &result {
            Ok(answer) => info!(
                qname = %query.name,
                domain = %answer.domain,
                revision = answer.revision,
                proof_len = answer.proof_len,
                txt_strings = answer.txt.len(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "Proof served"
            ),
            Err(e) => warn!(
                qname = %query.name,
                client = %query.source,
                stage = ?RequestStage::reached_before(e),
                error = %e,
                "Proof request failed"
            ),
        }

        result
    }

    async fn run(&self, query: &ProofQuery) -> Result<ProofAnswer, DomainError> {
        let domain = extract_subdomain(&query.name, &self.base_zone);
        debug!(qname = %query.name, domain = %domain, stage = ?RequestStage::DomainExtracted);

        let domains = vec![domain.clone()];
        let mut proofs = self.map_client.retrieve_proofs(&domains).await?;
        if proofs.len() != domains.len() {
            return Err(RetrievalError::Incomplete {
                requested: domains.len(),
                received: proofs.len(),
            }
            .into());
        }
        debug!(domain = %domain, stage = ?RequestStage::ProofsRetrieved);

        let proof = proofs.remove(0);
        let validated = self.validator.validate(proof, &domain)?;
        let revision = validated.proof().map_root.revision;
        debug!(domain = %domain, stage = ?RequestStage::ProofValidated);

        let bytes = validated.into_bytes();
        if bytes.is_empty() {
            return Err(EncodingError::EmptyProof.into());
        }
        let txt = txt_encoding::encode(&bytes);

        Ok(ProofAnswer {
            domain,
            txt,
            proof_len: bytes.len(),
            revision,
        })
    }
}
