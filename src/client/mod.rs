//! FHEM backend client abstraction and entity data model
//!
//! The core never talks HTTP directly. It queries entities through the
//! `FhemClient` trait and writes commands as plain FHEM command strings.

pub mod http_client;
pub mod session;

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use http_client::FhemHttpClient;
pub use session::{Session, SessionHandle};

/// A single live reading of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Reading value; FHEM reports strings, numbers or null
    #[serde(rename = "Value", default)]
    pub value: serde_json::Value,

    /// Timestamp as reported by FHEM
    #[serde(rename = "Time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl Reading {
    /// Create a reading without timestamp
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            time: None,
        }
    }

    /// Value rendered as text; `None` for null
    pub fn text(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Backend-side controllable or sensing object, as returned by `jsonlist2`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FhemEntity {
    /// Stable FHEM device name
    #[serde(rename = "Name")]
    pub name: String,

    /// Internal values (`TYPE`, `NAME`, channel links, ...)
    #[serde(rename = "Internals", default)]
    pub internals: BTreeMap<String, serde_json::Value>,

    /// Live readings
    #[serde(rename = "Readings", default)]
    pub readings: BTreeMap<String, Reading>,

    /// User-assigned attributes (`room`, `alias`, `genericDeviceType`, ...)
    #[serde(rename = "Attributes", default)]
    pub attributes: BTreeMap<String, String>,
}

impl FhemEntity {
    /// Create an empty entity with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: set an attribute
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Builder: set a reading
    pub fn with_reading(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.readings.insert(key.to_string(), Reading::new(value));
        self
    }

    /// Builder: set an internal
    pub fn with_internal(mut self, key: &str, value: &str) -> Self {
        self.internals
            .insert(key.to_string(), serde_json::Value::String(value.to_string()));
        self
    }

    /// Attribute value, if present
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Reading, if present
    pub fn reading(&self, key: &str) -> Option<&Reading> {
        self.readings.get(key)
    }

    /// Reading value as text, if present and not null
    pub fn reading_text(&self, key: &str) -> Option<String> {
        self.reading(key).and_then(Reading::text)
    }

    /// Internal value as text, if present
    pub fn internal(&self, key: &str) -> Option<&str> {
        self.internals.get(key).and_then(|v| v.as_str())
    }

    /// FHEM module type (`TYPE` internal)
    pub fn device_type(&self) -> Option<&str> {
        self.internal("TYPE")
    }

    /// Alias attribute, if set and non-empty
    pub fn alias(&self) -> Option<&str> {
        self.attribute("alias").filter(|a| !a.trim().is_empty())
    }

    /// Human-facing name: alias if set, otherwise the device name
    pub fn display_name(&self) -> &str {
        self.alias().unwrap_or(&self.name)
    }

    /// Rooms from the comma-joined `room` attribute, if present
    pub fn rooms(&self) -> Option<Vec<&str>> {
        self.attribute("room").map(|rooms| {
            rooms
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .collect()
        })
    }
}

/// Kind of device, as advertised by `genericDeviceType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Switch,
    Light,
    Outlet,
    Sensor,
    Thermometer,
    Thermostat,
}

impl DeviceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceClass::Switch => "switch",
            DeviceClass::Light => "light",
            DeviceClass::Outlet => "outlet",
            DeviceClass::Sensor => "sensor",
            DeviceClass::Thermometer => "thermometer",
            DeviceClass::Thermostat => "thermostat",
        }
    }
}

/// Alternation of device classes, rendered as an FHEM filter pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceClassFilter {
    classes: Vec<DeviceClass>,
}

impl DeviceClassFilter {
    pub fn new(classes: impl IntoIterator<Item = DeviceClass>) -> Self {
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    /// Switchable devices
    pub fn switchable() -> Self {
        Self::new([DeviceClass::Light, DeviceClass::Switch, DeviceClass::Outlet])
    }

    /// Devices whose state is a measurement
    pub fn sensors() -> Self {
        Self::new([DeviceClass::Sensor, DeviceClass::Thermometer])
    }

    /// Climate controllers
    pub fn thermostats() -> Self {
        Self::new([DeviceClass::Thermostat])
    }

    /// FHEM regex, e.g. `(light|switch|outlet)` or `thermostat`
    pub fn pattern(&self) -> String {
        let names: Vec<&str> = self.classes.iter().copied().map(DeviceClass::as_str).collect();
        match names.as_slice() {
            [single] => single.to_string(),
            many => format!("({})", many.join("|")),
        }
    }
}

impl fmt::Display for DeviceClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

/// Entity query, rendered as an FHEM devspec
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityQuery {
    /// Exact device name
    pub name: Option<String>,
    /// Room membership
    pub room: Option<String>,
    /// FHEM module type (`TYPE` internal)
    pub device_type: Option<String>,
    /// Attribute regex filters
    pub filters: Vec<(String, String)>,
}

impl EntityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for one device by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn in_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn of_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    pub fn with_filter(mut self, attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.push((attribute.into(), pattern.into()));
        self
    }

    /// Restrict to a device class via `genericDeviceType`
    pub fn with_class(self, filter: &DeviceClassFilter) -> Self {
        self.with_filter("genericDeviceType", filter.pattern())
    }

    /// FHEM devspec, e.g. `room=Homebridge:FILTER=genericDeviceType=(light|switch)`
    pub fn devspec(&self) -> String {
        let mut parts = Vec::new();

        if let Some(name) = &self.name {
            parts.push(name.clone());
        }
        if let Some(room) = &self.room {
            parts.push(format!("room={room}"));
        }
        if let Some(device_type) = &self.device_type {
            parts.push(format!("TYPE={device_type}"));
        }
        for (attribute, pattern) in &self.filters {
            parts.push(format!("{attribute}={pattern}"));
        }

        if parts.is_empty() {
            ".*".to_string()
        } else {
            parts.join(":FILTER=")
        }
    }

    /// Evaluate the query locally the way FHEM evaluates a devspec
    pub fn matches(&self, entity: &FhemEntity) -> Result<bool> {
        if let Some(name) = &self.name {
            if &entity.name != name {
                return Ok(false);
            }
        }

        if let Some(room) = &self.room {
            let in_room = entity
                .rooms()
                .map(|rooms| rooms.iter().any(|r| r == room))
                .unwrap_or(false);
            if !in_room {
                return Ok(false);
            }
        }

        if let Some(device_type) = &self.device_type {
            if !anchored(device_type)?.is_match(entity.device_type().unwrap_or_default()) {
                return Ok(false);
            }
        }

        for (attribute, pattern) in &self.filters {
            let Some(value) = entity.attribute(attribute) else {
                return Ok(false);
            };
            if !anchored(pattern)?.is_match(value) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

fn anchored(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{pattern})$"))?)
}

/// Raw response to a written command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FhemResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub text: String,
}

impl FhemResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            text: text.into(),
        }
    }
}

/// Trait for FHEM backend implementations
#[async_trait]
pub trait FhemClient: Send + Sync {
    /// Fetch every entity matching the query; always current, never cached
    async fn query(&self, query: &EntityQuery) -> Result<Vec<FhemEntity>>;

    /// Write a raw FHEM command such as `set lamp on`
    async fn send_cmd(&self, command: &str) -> Result<FhemResponse>;

    /// Health check
    async fn health_check(&self) -> Result<bool>;

    /// Re-read a single entity by name
    async fn get_device(&self, name: &str) -> Result<Option<FhemEntity>> {
        let mut entities = self.query(&EntityQuery::named(name)).await?;
        Ok(match entities.len() {
            1 => entities.pop(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lamp() -> FhemEntity {
        FhemEntity::new("kitchen_lamp")
            .with_internal("TYPE", "dummy")
            .with_attribute("room", "Homebridge, Kitchen")
            .with_attribute("genericDeviceType", "light")
            .with_attribute("alias", "Kitchen Lamp")
            .with_reading("state", "off")
    }

    #[test]
    fn test_devspec_rendering() {
        let query = EntityQuery::new()
            .in_room("Homebridge")
            .with_class(&DeviceClassFilter::switchable());
        assert_eq!(
            query.devspec(),
            "room=Homebridge:FILTER=genericDeviceType=(light|switch|outlet)"
        );

        let query = EntityQuery::new().in_room("Homebridge").of_type("ROOMMATE");
        assert_eq!(query.devspec(), "room=Homebridge:FILTER=TYPE=ROOMMATE");

        assert_eq!(EntityQuery::named("lamp").devspec(), "lamp");
        assert_eq!(EntityQuery::new().devspec(), ".*");
        assert_eq!(DeviceClassFilter::thermostats().pattern(), "thermostat");
    }

    #[test]
    fn test_local_query_matching() {
        let entity = lamp();

        let query = EntityQuery::new()
            .in_room("Kitchen")
            .with_class(&DeviceClassFilter::switchable());
        assert!(query.matches(&entity).unwrap());

        let query = EntityQuery::new()
            .in_room("Homebridge")
            .with_class(&DeviceClassFilter::sensors());
        assert!(!query.matches(&entity).unwrap());

        assert!(!EntityQuery::new().in_room("Bath").matches(&entity).unwrap());
        assert!(EntityQuery::new().of_type("dummy").matches(&entity).unwrap());
        assert!(!EntityQuery::new().of_type("dum").matches(&entity).unwrap());
    }

    #[test]
    fn test_entity_accessors() {
        let entity = lamp();
        assert_eq!(entity.display_name(), "Kitchen Lamp");
        assert_eq!(entity.rooms(), Some(vec!["Homebridge", "Kitchen"]));
        assert_eq!(entity.device_type(), Some("dummy"));
        assert_eq!(entity.reading_text("state").as_deref(), Some("off"));
        assert_eq!(entity.reading_text("missing"), None);
    }

    #[test]
    fn test_jsonlist2_entry_deserialization() {
        let json = serde_json::json!({
            "Name": "wz_thermostat",
            "PossibleSets": "desired-temp",
            "Internals": { "NAME": "wz_thermostat", "TYPE": "FHT", "NR": "42" },
            "Readings": {
                "desired-temp": { "Value": "21.0", "Time": "2024-01-01 12:00:00" },
                "measured-temp": { "Value": 20.4, "Time": "2024-01-01 12:00:00" },
                "Answer": { "Value": null, "Time": "2024-01-01 12:00:00" }
            },
            "Attributes": { "room": "Homebridge", "genericDeviceType": "thermostat" }
        });

        let entity: FhemEntity = serde_json::from_value(json).unwrap();
        assert_eq!(entity.device_type(), Some("FHT"));
        assert_eq!(entity.reading_text("desired-temp").as_deref(), Some("21.0"));
        assert_eq!(entity.reading_text("measured-temp").as_deref(), Some("20.4"));
        assert_eq!(entity.reading_text("Answer"), None);
        assert!(entity.reading("Answer").is_some());
    }
}
