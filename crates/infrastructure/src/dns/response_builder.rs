//! Reply construction for proof queries.

use hickory_proto::op::{Edns, Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::TXT;
use hickory_proto::rr::{RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use mapserver_dns_application::use_cases::ProofAnswer;
use mapserver_dns_domain::txt_encoding;
use mapserver_dns_domain::{DomainError, EncodingError};

/// Proofs are never cacheable.
pub const PROOF_TTL: u32 = 0;

/// Payload size advertised in our own OPT record.
pub const EDNS_MAX_PAYLOAD: u16 = 4096;

/// Largest message a TCP length prefix can carry.
pub const MAX_TCP_MESSAGE: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Udp,
    Tcp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }
}

pub struct ProofResponseBuilder;

impl ProofResponseBuilder {
    /// Authoritative NOERROR reply carrying the proof as one TXT record
    /// owned by the question name.
    pub fn build(request: &Message, answer: &ProofAnswer) -> Result<Message, DomainError> {
        let question = request.queries().first().ok_or_else(|| {
            DomainError::InvalidQuery("query has no question section".to_string())
        })?;

        let strings = answer
            .txt
            .iter()
            .enumerate()
            .map(|(i, s)| txt_encoding::decode_string(i, s))
            .collect::<Result<Vec<_>, _>>()?;
        let txt = TXT::from_bytes(strings.iter().map(Vec::as_slice).collect());

        let mut response = Self::reply_to(request, ResponseCode::NoError);
        response.add_answer(Record::from_rdata(
            question.name().clone(),
            PROOF_TTL,
            RData::TXT(txt),
        ));
        Ok(response)
    }

    pub fn servfail(request: &Message) -> Message {
        Self::reply_to(request, ResponseCode::ServFail)
    }

    /// Serializes `response`, falling back to an empty truncated reply when
    /// it does not fit the client's UDP payload limit. A TCP reply is never
    /// truncated; one that cannot be framed is an error.
    pub fn encode_for(
        request: &Message,
        response: &Message,
        transport: Transport,
        max_payload: u16,
    ) -> Result<Vec<u8>, DomainError> {
        let bytes = Self::serialize(response)?;
        if transport == Transport::Tcp {
            if bytes.len() > MAX_TCP_MESSAGE {
                return Err(EncodingError::ReplyTooLarge {
                    size: bytes.len(),
                    max: MAX_TCP_MESSAGE,
                }
                .into());
            }
            return Ok(bytes);
        }
        if bytes.len() <= max_payload as usize {
            return Ok(bytes);
        }

        let mut truncated = Self::reply_to(request, response.response_code());
        truncated.set_truncated(true);
        Self::serialize(&truncated)
    }

    pub fn serialize(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message
            .emit(&mut encoder)
            .map_err(|e| EncodingError::Serialize(e.to_string()))?;

        Ok(buf)
    }

    fn reply_to(request: &Message, code: ResponseCode) -> Message {
        let mut response = Message::new(request.id(), MessageType::Response, request.op_code());
        response.set_recursion_desired(request.recursion_desired());
        response.set_authoritative(true);
        response.set_response_code(code);
        response.add_queries(request.queries().iter().cloned());

        if request.extensions().is_some() {
            let mut edns = Edns::new();
            edns.set_max_payload(EDNS_MAX_PAYLOAD);
            *response.extensions_mut() = Some(edns);
        }

        response
    }
}
