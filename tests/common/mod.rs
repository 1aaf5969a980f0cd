//! Shared test infrastructure for catalog integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder, BinEncoder};
use hickory_server::authority::{Catalog, MessageRequest, MessageResponse};
use hickory_server::proto::rr::Record;
use hickory_server::proto::xfer::Protocol;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};

use cname_wrr_dns::config::{AliasConfig, DnsConfig, SoaConfig, WeightConfig, ZoneConfig};
use cname_wrr_dns::DnsServer;

// --- Constants ---

pub const ORIGIN: &str = "example.com";
pub const API_NAME: &str = "api.example.com";
pub const VM_X: &str = "x.ec2.internal.";
pub const VM_Y: &str = "y.ec2.internal.";
pub const CLUSTER_Z: &str = "z.default.svc.cluster.local.";

// --- TestResponseHandler ---

/// Captures the serialized DNS response for inspection in tests.
///
/// Implements `ResponseHandler` so it can be passed to `Catalog::handle_request()`.
/// The response is serialized via `MessageResponse::destructive_emit()` and stored
/// as raw wire-format bytes, which can then be parsed with `Message::from_vec()`.
#[derive(Clone)]
pub struct TestResponseHandler {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl TestResponseHandler {
    pub fn new() -> Self {
        Self {
            buf: Arc::new(Mutex::new(Vec::with_capacity(512))),
        }
    }

    /// Parse the captured wire bytes into a `Message` for assertions.
    pub fn into_message(self) -> Message {
        let buf = self.buf.lock().unwrap();
        assert!(!buf.is_empty(), "no response was captured");
        Message::from_vec(&buf).expect("failed to parse captured DNS response")
    }
}

#[async_trait]
impl ResponseHandler for TestResponseHandler {
    async fn send_response<'a>(
        &mut self,
        response: MessageResponse<
            '_,
            'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
        >,
    ) -> io::Result<ResponseInfo> {
        let mut buf = self.buf.lock().unwrap();
        buf.clear();
        let mut encoder = BinEncoder::new(&mut *buf);
        encoder.set_max_size(u16::MAX);
        let info = response
            .destructive_emit(&mut encoder)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(info)
    }
}

// --- Config builders ---

/// One zone with `api` aliased to two VM targets and one cluster target.
pub fn api_zone() -> ZoneConfig {
    zone_with_targets(&[VM_X, VM_Y, CLUSTER_Z])
}

pub fn zone_with_targets(targets: &[&str]) -> ZoneConfig {
    ZoneConfig {
        origin: ORIGIN.to_string(),
        aliases: vec![
            AliasConfig {
                name: "api".to_string(),
                targets: targets.iter().map(|t| t.to_string()).collect(),
            },
            AliasConfig {
                name: "www".to_string(),
                targets: vec!["web-1.ec2.internal.".to_string()],
            },
        ],
    }
}

pub fn weight(zone: &str, vm: u32, cluster: u32) -> WeightConfig {
    WeightConfig {
        zone: zone.to_string(),
        vm,
        cluster,
    }
}

pub fn test_dns_config(weights: Vec<WeightConfig>) -> DnsConfig {
    DnsConfig {
        listen_addr: "127.0.0.1:5353".parse().unwrap(),
        ttl: 60,
        soa: SoaConfig::default(),
        zones: vec![api_zone()],
        weights,
        weight_file: None,
        reload_interval_secs: 0,
        cluster_pattern: "svc.cluster".to_string(),
    }
}

/// Build a server and its catalog.
pub fn build_server(config: DnsConfig) -> (DnsServer, Catalog) {
    let server = DnsServer::new(config).expect("failed to create DnsServer");
    let catalog = server.build_catalog().expect("failed to build catalog");
    (server, catalog)
}

// --- Query/Request construction ---

/// Build wire-format bytes for a DNS query.
pub fn build_query_bytes(name: &str, record_type: RecordType, id: u16) -> Vec<u8> {
    let mut msg = Message::new();
    msg.set_id(id);
    msg.set_message_type(MessageType::Query);
    msg.set_op_code(OpCode::Query);
    msg.set_recursion_desired(true);
    let mut query = Query::new();
    query.set_name(Name::from_ascii(name).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);
    msg.add_query(query);
    msg.to_vec().unwrap()
}

/// Parse wire bytes into a MessageRequest.
pub fn parse_message_request(bytes: &[u8]) -> MessageRequest {
    let mut decoder = BinDecoder::new(bytes);
    MessageRequest::read(&mut decoder).expect("failed to parse MessageRequest")
}

/// Build a full `Request` from a fixed client address.
pub fn build_request(name: &str, record_type: RecordType, id: u16) -> Request {
    let bytes = build_query_bytes(name, record_type, id);
    let msg = parse_message_request(&bytes);
    let src: SocketAddr = "127.0.0.1:12345".parse().unwrap();
    Request::new(msg, src, Protocol::Udp)
}

// --- Response helpers ---

/// Execute a query through the catalog and return the parsed response.
pub async fn execute_query(
    catalog: &Catalog,
    name: &str,
    record_type: RecordType,
    id: u16,
) -> Message {
    let request = build_request(name, record_type, id);
    let handler = TestResponseHandler::new();
    catalog.handle_request(&request, handler.clone()).await;
    handler.into_message()
}

/// Extract CNAME targets from a response.
pub fn extract_cname_targets(msg: &Message) -> Vec<String> {
    msg.answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::CNAME(cname) => Some(cname.0.to_string()),
            _ => None,
        })
        .collect()
}

/// Assert response code.
pub fn assert_response_code(msg: &Message, expected: ResponseCode) {
    assert_eq!(
        msg.response_code(),
        expected,
        "expected {:?}, got {:?}",
        expected,
        msg.response_code()
    );
}

/// Assert a successful response carrying exactly one CNAME, and return its target.
pub fn single_cname(msg: &Message) -> String {
    assert_response_code(msg, ResponseCode::NoError);
    let targets = extract_cname_targets(msg);
    assert_eq!(
        targets.len(),
        1,
        "expected exactly one CNAME, got {:?}",
        targets
    );
    targets[0].clone()
}

/// Run `count` CNAME queries for `name` and collect the targets.
pub async fn query_targets(catalog: &Catalog, name: &str, count: u16) -> Vec<String> {
    let mut targets = Vec::with_capacity(count as usize);
    for id in 0..count {
        let msg = execute_query(catalog, name, RecordType::CNAME, id).await;
        targets.push(single_cname(&msg));
    }
    targets
}
