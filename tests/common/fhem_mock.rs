//! WireMock-based FHEMWEB mocking infrastructure
//!
//! Simulates the `/fhem` endpoint: the CSRF handshake, `jsonlist2` queries
//! and plain commands, for testing without a running FHEM.

use fhem_voice_rust::SkillSettings;
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const CSRF_TOKEN: &str = "csrf_123456789";

/// Mock FHEM server for testing
pub struct MockFhemServer {
    pub server: MockServer,
}

impl MockFhemServer {
    /// Start a server that answers the CSRF handshake
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let mock_server = Self { server };
        mock_server.mock_handshake().await;
        mock_server
    }

    /// Start a server without any mounted endpoint
    pub async fn start_bare() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Settings pointing at this server
    pub fn settings(&self) -> SkillSettings {
        let address = self.server.address();
        SkillSettings {
            host: Some(address.ip().to_string()),
            port: Some(address.port().to_string()),
            ..SkillSettings::default()
        }
    }

    /// Any XHR request without a more specific mock gets an empty 200 with
    /// the CSRF header, like FHEMWEB does
    async fn mock_handshake(&self) {
        Mock::given(method("GET"))
            .and(path("/fhem"))
            .and(query_param("XHR", "1"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("X-FHEM-csrfToken", CSRF_TOKEN),
            )
            .with_priority(10)
            .mount(&self.server)
            .await;
    }

    /// Answer `jsonlist2 <devspec>` with the given entities
    pub async fn mock_jsonlist(&self, devspec: &str, entities: Vec<Value>) {
        let count = entities.len();
        let body = json!({
            "Arg": devspec,
            "Results": entities,
            "totalResultsReturned": count,
        });

        Mock::given(method("GET"))
            .and(path("/fhem"))
            .and(query_param("cmd", format!("jsonlist2 {devspec}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer one command with a text body; requires the CSRF token
    pub async fn mock_command(&self, command: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path("/fhem"))
            .and(query_param("cmd", command))
            .and(query_param("fwcsrf", CSRF_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Reject everything with the given status
    pub async fn mock_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/fhem"))
            .respond_with(ResponseTemplate::new(status).set_body_string("denied"))
            .mount(&self.server)
            .await;
    }
}

/// Entity in `jsonlist2` shape
pub fn jsonlist_entity(name: &str, device_type: &str, attributes: Value, readings: Value) -> Value {
    let readings: serde_json::Map<String, Value> = readings
        .as_object()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            (
                key,
                json!({ "Value": value, "Time": "2024-01-01 12:00:00" }),
            )
        })
        .collect();

    json!({
        "Name": name,
        "PossibleSets": "",
        "PossibleAttrs": "",
        "Internals": { "NAME": name, "TYPE": device_type, "STATE": "" },
        "Readings": readings,
        "Attributes": attributes,
    })
}
