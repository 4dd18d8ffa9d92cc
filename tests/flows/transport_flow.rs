//! Wire-level behaviour of the listeners: TCP framing, UDP truncation,
//! EDNS negotiation and cookies.

use crate::common::{TestClient, TestServer, TestServerBuilder, ZONE};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::opt::{EdnsCode, EdnsOption};
use hickory_proto::rr::RecordType;
use redzone_domain::ZoneConfig;
use redzone_infrastructure::dns::edns::cookie_option;

fn big_location() -> String {
    let records: Vec<String> = (0..40)
        .map(|i| format!(r#"{{"text": "{}{}"}}"#, "y".repeat(200), i))
        .collect();
    format!(r#"{{"txt": {{"ttl": 60, "records": [{}]}}}}"#, records.join(","))
}

async fn start(builder: TestServerBuilder) -> (TestServer, TestClient) {
    let server = builder
        .with_zone(ZONE, ZoneConfig::default())
        .with_location(ZONE, "www", r#"{"a": {"ttl": 300, "records": [{"ip": "192.0.2.1"}]}}"#)
        .with_location(ZONE, "big", &big_location())
        .build()
        .await
        .expect("Failed to start server");
    let client = TestClient::new(server.udp_addr(), server.tcp_addr());
    (server, client)
}

// ============================================================================
// TCP
// ============================================================================

#[tokio::test]
async fn test_tcp_connection_serves_several_queries() {
    // Arrange
    let (server, client) = start(TestServerBuilder::new()).await;
    let requests = vec![
        TestClient::request("www.example.com.", RecordType::A),
        TestClient::request("nothere.example.com.", RecordType::A),
        TestClient::request("big.example.com.", RecordType::TXT),
    ];

    // Act
    let responses = client.send_tcp(&requests).await.unwrap();

    // Assert
    assert_eq!(responses.len(), 3);
    for (request, response) in requests.iter().zip(&responses) {
        assert_eq!(request.id(), response.id());
    }
    assert_eq!(responses[0].response_code(), ResponseCode::NoError);
    assert_eq!(responses[1].response_code(), ResponseCode::NXDomain);
    assert_eq!(responses[2].answers().len(), 40);
    assert!(!responses[2].truncated());

    server.shutdown().await;
}

#[tokio::test]
async fn test_truncated_udp_answer_retried_over_tcp() {
    let (server, client) = start(TestServerBuilder::new()).await;

    let udp = client.query("big.example.com.", RecordType::TXT).await.unwrap();
    let tcp = client
        .send_tcp(&[TestClient::request("big.example.com.", RecordType::TXT)])
        .await
        .unwrap();

    assert!(udp.truncated());
    assert!(udp.answers().is_empty());
    assert_eq!(tcp[0].answers().len(), 40);

    server.shutdown().await;
}

// ============================================================================
// EDNS
// ============================================================================

#[tokio::test]
async fn test_edns_payload_is_capped_at_server_limit() {
    let (server, client) = start(TestServerBuilder::new()).await;
    let request = TestClient::with_edns(
        TestClient::request("big.example.com.", RecordType::TXT),
        4096,
        false,
    );

    let response = client.send_udp(&request).await.unwrap();

    // The server caps the advertised payload at its own limit.
    assert_eq!(response.extensions().as_ref().unwrap().max_payload(), 1232);
    assert!(response.truncated());

    server.shutdown().await;
}

#[tokio::test]
async fn test_cookie_round_trip_over_udp() {
    // Arrange
    let (server, client) = start(TestServerBuilder::new().with_cookies()).await;
    let mut first = TestClient::with_edns(
        TestClient::request("www.example.com.", RecordType::A),
        1232,
        false,
    );
    if let Some(edns) = first.extensions_mut().as_mut() {
        edns.options_mut()
            .insert(EdnsOption::Unknown(u16::from(EdnsCode::Cookie), vec![3u8; 8]));
    }

    // Act
    let response = client.send_udp(&first).await.unwrap();
    let issued = cookie_option(response.extensions().as_ref().unwrap())
        .unwrap()
        .to_vec();

    let mut second = TestClient::with_edns(
        TestClient::request("www.example.com.", RecordType::A),
        1232,
        false,
    );
    if let Some(edns) = second.extensions_mut().as_mut() {
        edns.options_mut()
            .insert(EdnsOption::Unknown(u16::from(EdnsCode::Cookie), issued.clone()));
    }
    let repeat = client.send_udp(&second).await.unwrap();

    // Assert
    assert_eq!(issued.len(), 24);
    assert_eq!(&issued[..8], &[3u8; 8]);
    assert_eq!(repeat.response_code(), ResponseCode::NoError);
    assert_eq!(repeat.answers().len(), 1);

    server.shutdown().await;
}
