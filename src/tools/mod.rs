//! Intent handlers for the voice host
//!
//! The host's grammar layer delivers slot records; every handler resolves
//! the device, performs at most one write, and answers with a dialog key
//! plus data for the host's renderer. Handlers never render text.

pub mod climate;
pub mod fallback;
pub mod presence;
pub mod sensor;
pub mod switch;
pub mod unsupported;

use crate::client::{FhemClient, Session, SessionHandle};
use crate::config::SessionConfig;
use crate::error::{FhemError, Result};
use crate::log_structured_error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, Instrument};

pub use fallback::FallbackReply;

/// Dialog keys understood by the host's renderer
pub mod dialog {
    pub const SWITCH: &str = "fhem.switch";
    pub const ALREADY: &str = "fhem.device.already";
    pub const UNKNOWN_DEVICE: &str = "fhem.device.unknown";
    pub const SENSOR: &str = "fhem.sensor";
    pub const PRESENCE_FOUND: &str = "fhem.presence.found";
    pub const PRESENCE_ERROR: &str = "fhem.presence.error";
    pub const SET_THERMOSTAT: &str = "fhem.set.thermostat";
    pub const THERMOSTAT_BAD_REQUEST: &str = "fhem.thermostat.badreq";
    pub const SETUP_ERROR: &str = "fhem.error.setup";
    pub const OFFLINE: &str = "fhem.error.offline";
    pub const SORRY: &str = "fhem.error.sorry";
    pub const NOT_SUPPORTED: &str = "fhem.error.notsupported";
}

/// Slot record delivered by the grammar layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSlots {
    /// Device, entity or person the user named
    pub device: Option<String>,
    /// Action word, e.g. "on" or "einschalten"
    pub action: Option<String>,
    /// Numeric argument as spoken, e.g. "21.5"
    pub value: Option<String>,
}

impl IntentSlots {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: Some(device.into()),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Named device; a missing slot is an input error
    pub fn device(&self) -> Result<&str> {
        self.device
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| FhemError::invalid_input("missing device slot"))
    }

    /// Action word, empty when the user gave none
    pub fn action(&self) -> &str {
        self.action.as_deref().map(str::trim).unwrap_or("")
    }

    /// Numeric slot; a missing value is an input error
    pub fn value(&self) -> Result<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FhemError::invalid_input("missing value slot"))
    }
}

/// Dialog key plus template data, the only output of an intent turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogResponse {
    pub dialog: String,
    pub data: BTreeMap<String, String>,
}

impl DialogResponse {
    pub fn new(dialog: &str) -> Self {
        Self {
            dialog: dialog.to_string(),
            data: BTreeMap::new(),
        }
    }

    /// Add a template variable
    pub fn with(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }

    /// Spoken answer for a failed turn
    pub fn from_error(error: &FhemError) -> Self {
        match error {
            FhemError::BackendUnavailable(_) => Self::new(dialog::OFFLINE),
            FhemError::EntityNotFound(name) => Self::new(dialog::UNKNOWN_DEVICE).with("dev_name", name),
            FhemError::NotSupported(_) | FhemError::MalformedEntityData(_) => {
                Self::new(dialog::NOT_SUPPORTED)
            }
            FhemError::OutOfRange { min, max, step, .. } => {
                Self::new(dialog::THERMOSTAT_BAD_REQUEST)
                    .with("minValue", min)
                    .with("maxValue", max)
                    .with("minStep", step)
            }
            FhemError::Config(_) | FhemError::Authentication(_) => Self::new(dialog::SETUP_ERROR),
            _ => Self::new(dialog::SORRY),
        }
    }
}

/// Shared context for one intent turn
///
/// Built from a session snapshot; nothing in it outlives the turn.
#[derive(Clone)]
pub struct ToolContext {
    pub client: Arc<dyn FhemClient>,
    pub config: Arc<SessionConfig>,
}

impl ToolContext {
    pub fn new(client: Arc<dyn FhemClient>, config: Arc<SessionConfig>) -> Self {
        Self { client, config }
    }

    pub fn from_session(session: &Session) -> Self {
        Self::new(session.client.clone(), session.config.clone())
    }

    pub fn client(&self) -> &dyn FhemClient {
        self.client.as_ref()
    }
}

/// Structured intents the core handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Switch,
    Sensor,
    Presence,
    Climate,
    LightSet,
    LightAdjust,
    Automation,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Sensor => "sensor",
            Self::Presence => "presence",
            Self::Climate => "climate",
            Self::LightSet => "light_set",
            Self::LightAdjust => "light_adjust",
            Self::Automation => "automation",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point for the host: one call per recognized intent or fallback
pub struct IntentRouter {
    sessions: Arc<SessionHandle>,
}

impl IntentRouter {
    pub fn new(sessions: Arc<SessionHandle>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &SessionHandle {
        &self.sessions
    }

    /// Handle one structured intent
    pub async fn handle(&self, kind: IntentKind, slots: IntentSlots) -> DialogResponse {
        let turn_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("intent", turn_id = %turn_id, intent = %kind);

        async move {
            let Some(session) = self.sessions.current().await else {
                info!("No FHEM session, reporting setup error");
                return DialogResponse::new(dialog::SETUP_ERROR);
            };
            let context = ToolContext::from_session(&session);

            let result = match kind {
                IntentKind::Switch => switch::handle_switch(context, slots).await,
                IntentKind::Sensor => sensor::handle_sensor(context, slots).await,
                IntentKind::Presence => presence::handle_presence(context, slots).await,
                IntentKind::Climate => climate::handle_set_thermostat(context, slots).await,
                IntentKind::LightSet => unsupported::handle_light_set(context, slots).await,
                IntentKind::LightAdjust => unsupported::handle_light_adjust(context, slots).await,
                IntentKind::Automation => unsupported::handle_automation(context, slots).await,
            };

            match result {
                Ok(response) => {
                    info!(dialog = %response.dialog, "Intent handled");
                    response
                }
                Err(e) => {
                    log_structured_error!(e, "tools", kind.as_str(), turn_id.clone());
                    DialogResponse::from_error(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Forward an utterance no intent matched
    pub async fn fallback(&self, utterance: &str) -> FallbackReply {
        let turn_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("fallback", turn_id = %turn_id);

        async move {
            let Some(session) = self.sessions.current().await else {
                info!("No FHEM session, fallback not handled");
                return FallbackReply::setup_error();
            };
            fallback::handle_fallback(ToolContext::from_session(&session), utterance, &turn_id).await
        }
        .instrument(span)
        .await
    }
}
