use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use mapserver_dns_application::services::ProofValidator;
use mapserver_dns_application::use_cases::ServeProofUseCase;
use mapserver_dns_domain::{DomainError, EncodingError, RetrievalError, ValidationError};
use mapserver_dns_infrastructure::dns::{DnsServerHandler, Transport, PROOF_TTL};
use mapserver_dns_infrastructure::map_client::TcpMapClient;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

mod helpers;
use helpers::{
    signed_proof, signed_proof_with_entry, test_public_key, MockBehavior, MockMapServer, TREE_ID,
    TREE_NONCE,
};

const ZONE: &str = "example.com.";

fn source() -> SocketAddr {
    "198.51.100.7:40000".parse().unwrap()
}

fn query_packet(name: &str, id: u16, edns_payload: Option<u16>) -> Vec<u8> {
    let mut query = Query::new();
    query.set_name(Name::from_str(name).unwrap());
    query.set_query_type(RecordType::TXT);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);
    if let Some(payload) = edns_payload {
        let mut edns = Edns::new();
        edns.set_max_payload(payload);
        *message.extensions_mut() = Some(edns);
    }

    let mut buf = Vec::new();
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).unwrap();
    buf
}

async fn handler_for(behavior: MockBehavior) -> (DnsServerHandler, MockMapServer) {
    let server = MockMapServer::start(behavior).await.unwrap();
    let client = TcpMapClient::new(
        server.address(),
        TREE_ID,
        test_public_key(),
        1 << 20,
        Duration::from_secs(2),
    );
    let validator = ProofValidator::new(TREE_ID, test_public_key(), TREE_NONCE.to_vec());
    let use_case = ServeProofUseCase::new(Arc::new(client), validator, ZONE);
    (DnsServerHandler::new(Arc::new(use_case)), server)
}

fn proofs_for(names: &[&str]) -> MockBehavior {
    MockBehavior::Proofs(
        names
            .iter()
            .map(|n| (n.to_string(), signed_proof(n)))
            .collect::<HashMap<_, _>>(),
    )
}

fn txt_payload(reply: &Message) -> Vec<u8> {
    let RData::TXT(txt) = reply.answers()[0].data() else {
        panic!("expected TXT answer");
    };
    txt.txt_data().iter().flat_map(|c| c.iter().copied()).collect()
}

#[tokio::test]
async fn test_alice_gets_validated_proof() {
    let (handler, server) = handler_for(proofs_for(&["alice"])).await;

    let bytes = handler
        .handle(&query_packet("alice.example.com.", 0x1234, Some(4096)), source(), Transport::Udp)
        .await
        .unwrap();
    let reply = Message::from_vec(&bytes).unwrap();

    assert_eq!(reply.id(), 0x1234);
    assert_eq!(reply.message_type(), MessageType::Response);
    assert_eq!(reply.response_code(), ResponseCode::NoError);
    assert_eq!(reply.queries()[0].name(), &Name::from_str("alice.example.com.").unwrap());
    assert_eq!(reply.answers().len(), 1);
    assert_eq!(reply.answers()[0].ttl(), PROOF_TTL);
    assert_eq!(
        txt_payload(&reply),
        signed_proof("alice").to_canonical_bytes().unwrap()
    );
    assert_eq!(server.requests()[0].domains, vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_reply_over_tcp_is_complete() {
    let (handler, _server) = handler_for(proofs_for(&["alice"])).await;

    let bytes = handler
        .handle(&query_packet("alice.example.com.", 7, None), source(), Transport::Tcp)
        .await
        .unwrap();
    let reply = Message::from_vec(&bytes).unwrap();

    assert!(!reply.truncated());
    assert_eq!(reply.answers().len(), 1);
}

#[tokio::test]
async fn test_punycode_label_is_looked_up_as_sent() {
    let (handler, server) = handler_for(proofs_for(&["xn--bcher-kva"])).await;

    let bytes = handler
        .handle(
            &query_packet("xn--bcher-kva.example.com.", 3, Some(4096)),
            source(),
            Transport::Udp,
        )
        .await
        .unwrap();
    let reply = Message::from_vec(&bytes).unwrap();

    assert_eq!(reply.response_code(), ResponseCode::NoError);
    assert_eq!(server.requests()[0].domains, vec!["xn--bcher-kva".to_string()]);
}

#[tokio::test]
async fn test_tcp_reply_over_message_limit_fails_without_reply() {
    let mut proofs = HashMap::new();
    proofs.insert(
        "alice".to_string(),
        signed_proof_with_entry("alice", vec![0x5a; 70_000]),
    );
    let (handler, _server) = handler_for(MockBehavior::Proofs(proofs)).await;

    let err = handler
        .handle(&query_packet("alice.example.com.", 5, None), source(), Transport::Tcp)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Encoding(_)));
    assert!(!matches!(err, DomainError::Encoding(EncodingError::EmptyProof)));
}

#[tokio::test]
async fn test_plain_udp_reply_over_512_is_truncated() {
    let (handler, _server) = handler_for(proofs_for(&["alice"])).await;

    let bytes = handler
        .handle(&query_packet("alice.example.com.", 7, None), source(), Transport::Udp)
        .await
        .unwrap();
    let reply = Message::from_vec(&bytes).unwrap();

    assert!(reply.truncated());
    assert!(reply.answers().is_empty());
}

#[tokio::test]
async fn test_missing_proof_fails_without_reply() {
    let (handler, _server) = handler_for(proofs_for(&[])).await;

    let err = handler
        .handle(&query_packet("alice.example.com.", 1, Some(4096)), source(), Transport::Udp)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::Retrieval(RetrievalError::Incomplete { .. })
    ));
}

#[tokio::test]
async fn test_proof_for_wrong_domain_fails_without_reply() {
    let mut proofs = HashMap::new();
    proofs.insert("alice".to_string(), signed_proof("bob"));
    let (handler, _server) = handler_for(MockBehavior::Proofs(proofs)).await;

    let err = handler
        .handle(&query_packet("alice.example.com.", 1, Some(4096)), source(), Transport::Udp)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::Validation(ValidationError::DomainMismatch { .. })
    ));
}

#[tokio::test]
async fn test_garbage_packet_is_invalid_query() {
    let (handler, server) = handler_for(proofs_for(&["alice"])).await;

    let err = handler
        .handle(&[0x00, 0x01, 0x02], source(), Transport::Udp)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::InvalidQuery(_)));
    assert!(server.requests().is_empty());
}

#[test]
fn test_servfail_echoes_query() {
    let packet = query_packet("alice.example.com.", 0xbeef, None);

    let bytes = DnsServerHandler::servfail(&packet).unwrap();
    let reply = Message::from_vec(&bytes).unwrap();

    assert_eq!(reply.id(), 0xbeef);
    assert_eq!(reply.response_code(), ResponseCode::ServFail);
    assert!(reply.answers().is_empty());
}

#[test]
fn test_servfail_skips_unparsable_packets() {
    assert!(DnsServerHandler::servfail(&[0xff; 5]).is_none());
}

#[test]
fn test_parse_request_reads_edns_payload() {
    let packet = query_packet("Bob.Example.com.", 9, Some(1232));

    let (_, query) = DnsServerHandler::parse_request(&packet, source()).unwrap();

    assert_eq!(query.max_payload, 1232);
    assert_eq!(query.source, source());
}

#[test]
fn test_parse_request_defaults_payload_without_edns() {
    let packet = query_packet("bob.example.com.", 9, None);

    let (_, query) = DnsServerHandler::parse_request(&packet, source()).unwrap();

    assert_eq!(query.max_payload, 512);
    assert_eq!(&*query.name, "bob.example.com.");
}

#[test]
fn test_parse_request_keeps_ascii_form_of_idna_labels() {
    let packet = query_packet("xn--bcher-kva.example.com.", 9, None);

    let (_, query) = DnsServerHandler::parse_request(&packet, source()).unwrap();

    assert_eq!(&*query.name, "xn--bcher-kva.example.com.");
}
