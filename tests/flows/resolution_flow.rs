//! Queries answered end to end over UDP: listener, handler, resolution
//! engine and zone cache backed by the in-memory store.

use crate::common::{eventually, TestClient, TestServer, TestServerBuilder, ZONE};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{RData, RecordType};
use redzone_domain::ZoneConfig;
use std::net::Ipv4Addr;

async fn start() -> (TestServer, TestClient) {
    let server = TestServerBuilder::new()
        .with_zone(ZONE, ZoneConfig::default())
        .with_location(ZONE, "www", r#"{"a": {"ttl": 300, "records": [{"ip": "192.0.2.1"}]}}"#)
        .with_location(ZONE, "alias", r#"{"cname": {"ttl": 300, "host": "www.example.com."}}"#)
        .build()
        .await
        .expect("Failed to start server");
    let client = TestClient::new(server.udp_addr(), server.tcp_addr());
    (server, client)
}

fn a_records(message: &hickory_proto::op::Message) -> Vec<Ipv4Addr> {
    message
        .answers()
        .iter()
        .filter_map(|r| match r.data() {
            Some(RData::A(a)) => Some(a.0),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Answers
// ============================================================================

#[tokio::test]
async fn test_complete_resolution_flow() {
    // Arrange
    let (server, client) = start().await;

    // Act
    let response = client.query("www.example.com.", RecordType::A).await.unwrap();

    // Assert
    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert!(response.authoritative());
    assert_eq!(a_records(&response), vec![Ipv4Addr::new(192, 0, 2, 1)]);
    assert_eq!(response.answers()[0].ttl(), 300);

    server.shutdown().await;
}

#[tokio::test]
async fn test_missing_name_is_nxdomain_with_soa() {
    let (server, client) = start().await;

    let response = client.query("nothere.example.com.", RecordType::A).await.unwrap();

    assert_eq!(response.response_code(), ResponseCode::NXDomain);
    assert!(response.answers().is_empty());
    assert_eq!(response.name_servers()[0].record_type(), RecordType::SOA);

    server.shutdown().await;
}

#[tokio::test]
async fn test_foreign_zone_is_not_authoritative() {
    let (server, client) = start().await;

    let response = client.query("www.example.org.", RecordType::A).await.unwrap();

    assert_eq!(response.response_code(), ResponseCode::NotAuth);

    server.shutdown().await;
}

#[tokio::test]
async fn test_alias_is_followed_to_address() {
    let (server, client) = start().await;

    let response = client.query("alias.example.com.", RecordType::A).await.unwrap();

    let types: Vec<RecordType> = response.answers().iter().map(|r| r.record_type()).collect();
    assert_eq!(types, vec![RecordType::CNAME, RecordType::A]);
    assert_eq!(a_records(&response), vec![Ipv4Addr::new(192, 0, 2, 1)]);

    server.shutdown().await;
}

// ============================================================================
// Store changes
// ============================================================================

#[tokio::test]
async fn test_location_update_is_served_after_invalidation() {
    // Arrange
    let (server, client) = start().await;
    let before = client.query("www.example.com.", RecordType::A).await.unwrap();
    assert_eq!(a_records(&before), vec![Ipv4Addr::new(192, 0, 2, 1)]);

    // Act
    server
        .data()
        .set_location_from_json(
            ZONE,
            "www",
            r#"{"a": {"ttl": 300, "records": [{"ip": "192.0.2.77"}]}}"#,
        )
        .await
        .unwrap();

    // Assert
    let client = &client;
    let updated = eventually(|| async move {
        let response = client.query("www.example.com.", RecordType::A).await.unwrap();
        a_records(&response) == vec![Ipv4Addr::new(192, 0, 2, 77)]
    })
    .await;
    assert!(updated, "cached location was never refreshed");

    server.shutdown().await;
}

#[tokio::test]
async fn test_new_zone_is_served_after_reload() {
    let (server, client) = start().await;
    let before = client.query("www.example.net.", RecordType::A).await.unwrap();
    assert_eq!(before.response_code(), ResponseCode::NotAuth);

    server
        .data()
        .set_zone("example.net.", &ZoneConfig::default())
        .await
        .unwrap();
    server
        .data()
        .set_location_from_json(
            "example.net.",
            "www",
            r#"{"a": {"ttl": 60, "records": [{"ip": "198.51.100.8"}]}}"#,
        )
        .await
        .unwrap();

    let client = &client;
    let served = eventually(|| async move {
        let response = client.query("www.example.net.", RecordType::A).await.unwrap();
        response.response_code() == ResponseCode::NoError
            && a_records(&response) == vec![Ipv4Addr::new(198, 51, 100, 8)]
    })
    .await;
    assert!(served, "new zone was never picked up");

    server.shutdown().await;
}
