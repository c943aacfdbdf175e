//! FHEMWEB client against a WireMock server

mod common;

use common::fhem_mock::{jsonlist_entity, MockFhemServer, CSRF_TOKEN};
use fhem_voice_rust::client::{DeviceClassFilter, EntityQuery, FhemClient, FhemHttpClient};
use fhem_voice_rust::{FhemError, Session, SessionHandle, SkillSettings};
use serde_json::json;

async fn connected_client(server: &MockFhemServer) -> FhemHttpClient {
    let mut client = FhemHttpClient::new(&server.settings()).unwrap();
    client.connect().await.unwrap();
    client
}

#[tokio::test]
async fn test_connect_reads_csrf_token() {
    let server = MockFhemServer::start().await;
    let client = connected_client(&server).await;

    assert_eq!(client.csrf_token(), Some(CSRF_TOKEN));
    assert!(client.base_url().as_str().ends_with("/fhem"));
    assert!(client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_query_parses_jsonlist2() {
    let server = MockFhemServer::start().await;
    server
        .mock_jsonlist(
            "room=Homebridge:FILTER=genericDeviceType=(light|switch|outlet)",
            vec![
                jsonlist_entity(
                    "WZ_DeckenLicht",
                    "dummy",
                    json!({ "room": "Homebridge,Wohnzimmer", "genericDeviceType": "light", "alias": "Ceiling Light" }),
                    json!({ "state": "off" }),
                ),
                jsonlist_entity(
                    "coffee_outlet",
                    "FS20",
                    json!({ "room": "Homebridge", "genericDeviceType": "outlet" }),
                    json!({ "state": "on" }),
                ),
            ],
        )
        .await;
    let client = connected_client(&server).await;

    let query = EntityQuery::new()
        .in_room("Homebridge")
        .with_class(&DeviceClassFilter::switchable());
    let entities = client.query(&query).await.unwrap();

    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].name, "WZ_DeckenLicht");
    assert_eq!(entities[0].alias(), Some("Ceiling Light"));
    assert_eq!(entities[0].reading_text("state").as_deref(), Some("off"));
    assert_eq!(entities[1].device_type(), Some("FS20"));
    assert_eq!(entities[1].rooms(), Some(vec!["Homebridge"]));
}

#[tokio::test]
async fn test_commands_carry_csrf_token() {
    let server = MockFhemServer::start().await;
    server.mock_command("set lamp on", "").await;
    let client = connected_client(&server).await;

    let response = client.send_cmd("set lamp on").await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let server = MockFhemServer::start_bare().await;
    server.mock_status(401).await;

    let mut client = FhemHttpClient::new(&server.settings()).unwrap();
    let result = client.connect().await;
    assert!(matches!(result, Err(FhemError::Authentication(_))));
}

#[tokio::test]
async fn test_server_error_is_backend_unavailable() {
    let server = MockFhemServer::start_bare().await;
    server.mock_status(500).await;

    let mut client = FhemHttpClient::new(&server.settings()).unwrap();
    assert!(matches!(client.connect().await, Err(FhemError::BackendUnavailable(_))));
}

#[tokio::test]
async fn test_connection_refused_is_backend_unavailable() {
    let settings = SkillSettings {
        host: Some("127.0.0.1".to_string()),
        port: Some("1".to_string()),
        ..SkillSettings::default()
    };
    let mut client = FhemHttpClient::new(&settings).unwrap();

    assert!(matches!(client.connect().await, Err(FhemError::BackendUnavailable(_))));
    assert!(!client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_session_detects_fallback_device() {
    let server = MockFhemServer::start().await;
    server
        .mock_jsonlist(
            "talk",
            vec![jsonlist_entity("talk", "Talk2Fhem", json!({}), json!({ "Answer": null }))],
        )
        .await;

    let settings = SkillSettings {
        enable_fallback: true,
        fallback_device_name: "talk".to_string(),
        ..server.settings()
    };
    let session = Session::establish(&settings).await.unwrap();

    let fallback = session.config.fallback.clone().unwrap();
    assert_eq!(fallback.device_name, "talk");
    assert_eq!(fallback.backend.to_string(), "direct");
}

#[tokio::test]
async fn test_failed_reload_leaves_no_session() {
    let server = MockFhemServer::start().await;
    let handle = SessionHandle::new();

    handle.reload(&server.settings()).await.unwrap();
    assert!(handle.current().await.is_some());

    let broken = SkillSettings {
        port: Some("not-a-port".to_string()),
        ..server.settings()
    };
    assert!(matches!(handle.reload(&broken).await, Err(FhemError::Config(_))));
    assert!(handle.current().await.is_none());
}
