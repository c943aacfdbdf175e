//! Test fixtures for consistent test setup
//!
//! A small FHEM installation: lights and outlets in two rooms, a sensor,
//! thermostats of several families, roommates and a Talk2Fhem device.

use fhem_voice_rust::client::FhemEntity;
use fhem_voice_rust::config::{FallbackTarget, SessionConfig};
use fhem_voice_rust::mock::MockFhemClient;
use fhem_voice_rust::services::FallbackBackend;
use fhem_voice_rust::tools::ToolContext;
use rstest::*;
use std::sync::Arc;

pub const ROOM: &str = "Homebridge";

fn device(name: &str, class: &str, rooms: &str, state: &str) -> FhemEntity {
    FhemEntity::new(name)
        .with_attribute("room", rooms)
        .with_attribute("genericDeviceType", class)
        .with_reading("state", state)
}

/// Every entity of the test installation, in backend order
#[fixture]
pub fn installation() -> Vec<FhemEntity> {
    vec![
        device("WZ_DeckenLicht", "light", "Homebridge,Wohnzimmer", "off")
            .with_attribute("alias", "Ceiling Light"),
        device("lamp", "light", "Homebridge,Kitchen", "on"),
        device("lamp2", "light", "Homebridge,Bedroom", "off"),
        device("coffee_outlet", "outlet", "Homebridge,Kitchen", "off"),
        device("cellar_light", "light", "Cellar", "off"),
        device("bath_sensor", "sensor", "Homebridge,Bathroom", "T: 22.5 H: 61"),
        device("bath_heater", "thermostat", "Homebridge,Bathroom", "22.0")
            .with_internal("TYPE", "FHT")
            .with_reading("desired-temp", "21.0"),
        device("office_heater", "thermostat", "Homebridge,Office", "ok")
            .with_internal("TYPE", "dummy")
            .with_attribute(
                "homebridgeMapping",
                "CurrentTemperature=temperature TargetTemperature=desired-temp::desired-temp,minValue=5,maxValue=35,minStep=0.5,nocache=1",
            ),
        device("garage_fan", "thermostat", "Homebridge,Garage", "on"),
        FhemEntity::new("rr_anna")
            .with_internal("TYPE", "ROOMMATE")
            .with_attribute("room", "Homebridge")
            .with_attribute("rr_realname", "group")
            .with_attribute("group", "Anna")
            .with_reading("presence", "present"),
        FhemEntity::new("talk")
            .with_internal("TYPE", "Talk2Fhem")
            .with_reading("Answer", "Okay, the lights are on"),
    ]
}

/// Mock backend serving the installation
#[fixture]
pub fn mock_client(installation: Vec<FhemEntity>) -> Arc<MockFhemClient> {
    Arc::new(MockFhemClient::new().with_entities(installation))
}

/// Session config for the Homebridge room with Talk2Fhem fallback
#[fixture]
pub fn session_config() -> SessionConfig {
    SessionConfig {
        room: ROOM.to_string(),
        ignore_rooms: vec!["alexa".to_string()],
        fallback: Some(FallbackTarget {
            device_name: "talk".to_string(),
            backend: FallbackBackend::Direct,
        }),
        ..SessionConfig::default()
    }
}

/// Tool context over the mock backend
pub fn tool_context(client: &Arc<MockFhemClient>, config: SessionConfig) -> ToolContext {
    ToolContext::new(client.clone(), Arc::new(config))
}
