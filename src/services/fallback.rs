//! Fallback dispatch to conversational FHEM devices
//!
//! Utterances no intent matched are forwarded to a conversational module in
//! FHEM. The supported modules disagree on how a command is written and on
//! where the answer shows up, so each wire convention has its own handler:
//!
//! - `TextCommand` (TEERKO): `set <dev> TextCommand <utterance>`, answer in
//!   the `answers` reading once `status` reads `answers`
//! - `Direct` (Talk2Fhem): `set <dev> <utterance>`, answer in the `Answer`
//!   reading
//! - `EmbeddedFunction` (Babble): a perl call whose response text carries an
//!   acknowledgement marker; nothing is read back
//!
//! Transport failures propagate as `BackendUnavailable`. Everything else the
//! backend does is a silent pass, never an error.

use crate::client::FhemClient;
use crate::config::FallbackTarget;
use crate::error::Result;
use crate::services::executor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Substring in Babble's response that signals the utterance was understood
pub const BABBLE_MARKER: &str = "[Babble_Normalize]";

/// Wire convention of a conversational backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackBackend {
    TextCommand,
    Direct,
    EmbeddedFunction,
}

impl FallbackBackend {
    /// Recognize a backend by its FHEM module type
    pub fn from_fhem_type(device_type: &str) -> Option<Self> {
        match device_type {
            "TEERKO" => Some(Self::TextCommand),
            "Talk2Fhem" => Some(Self::Direct),
            "Babble" => Some(Self::EmbeddedFunction),
            _ => None,
        }
    }

    fn handler(self) -> &'static dyn FallbackHandler {
        HANDLERS
            .iter()
            .find(|(backend, _)| *backend == self)
            .map(|(_, handler)| *handler)
            .unwrap_or(&TextCommandHandler)
    }
}

impl fmt::Display for FallbackBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextCommand => "text_command",
            Self::Direct => "direct",
            Self::EmbeddedFunction => "embedded_function",
        };
        f.write_str(name)
    }
}

/// What a backend made of the utterance
#[derive(Debug, Clone, PartialEq, Eq)]
enum BackendReply {
    /// Answer text read back from the device
    Answer(String),
    /// Write response acknowledged the utterance, nothing to say
    Acknowledged,
    /// Backend did not handle it
    Passed,
}

#[async_trait]
trait FallbackHandler: Send + Sync {
    async fn exchange(
        &self,
        client: &dyn FhemClient,
        device: &str,
        utterance: &str,
    ) -> Result<BackendReply>;
}

struct TextCommandHandler;
struct DirectHandler;
struct EmbeddedFunctionHandler;

static HANDLERS: &[(FallbackBackend, &dyn FallbackHandler)] = &[
    (FallbackBackend::TextCommand, &TextCommandHandler),
    (FallbackBackend::Direct, &DirectHandler),
    (FallbackBackend::EmbeddedFunction, &EmbeddedFunctionHandler),
];

#[async_trait]
impl FallbackHandler for TextCommandHandler {
    async fn exchange(
        &self,
        client: &dyn FhemClient,
        device: &str,
        utterance: &str,
    ) -> Result<BackendReply> {
        executor::set_text(client, device, &format!("TextCommand {utterance}")).await?;

        let Some(entity) = client.get_device(device).await? else {
            return Ok(BackendReply::Passed);
        };
        if entity.reading_text("status").as_deref() != Some("answers") {
            return Ok(BackendReply::Passed);
        }
        Ok(entity
            .reading_text("answers")
            .map_or(BackendReply::Passed, BackendReply::Answer))
    }
}

#[async_trait]
impl FallbackHandler for DirectHandler {
    async fn exchange(
        &self,
        client: &dyn FhemClient,
        device: &str,
        utterance: &str,
    ) -> Result<BackendReply> {
        executor::set_text(client, device, utterance).await?;

        let answer = client
            .get_device(device)
            .await?
            .and_then(|entity| entity.reading_text("Answer"));
        Ok(answer.map_or(BackendReply::Passed, BackendReply::Answer))
    }
}

/// Perl double-quoted string contents, without interpolation
fn perl_quote(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('@', "\\@")
}

/// `{Babble_DoIt("<dev>","<utterance>","testit","1")}`
pub fn babble_command(device: &str, utterance: &str) -> String {
    executor::escape_text(&format!(
        "{{Babble_DoIt(\"{}\",\"{}\",\"testit\",\"1\")}}",
        perl_quote(device),
        perl_quote(utterance)
    ))
}

#[async_trait]
impl FallbackHandler for EmbeddedFunctionHandler {
    async fn exchange(
        &self,
        client: &dyn FhemClient,
        device: &str,
        utterance: &str,
    ) -> Result<BackendReply> {
        let response = executor::raw(client, &babble_command(device, utterance)).await?;
        if response.text.contains(BABBLE_MARKER) {
            Ok(BackendReply::Acknowledged)
        } else {
            Ok(BackendReply::Passed)
        }
    }
}

/// Uniform result of a fallback round trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackOutcome {
    pub handled: bool,
    pub answer: String,
    /// Answer ends in a question mark; keep listening for a reply
    pub is_question: bool,
}

impl FallbackOutcome {
    pub fn passed() -> Self {
        Self {
            handled: false,
            answer: String::new(),
            is_question: false,
        }
    }

    fn answered(answer: String) -> Self {
        let is_question = answer.trim_end().ends_with('?');
        Self {
            handled: true,
            answer,
            is_question,
        }
    }

    fn acknowledged() -> Self {
        Self {
            handled: true,
            ..Self::passed()
        }
    }
}

/// Forward an utterance to the fallback device and normalize its reply
pub async fn dispatch(
    client: &dyn FhemClient,
    utterance: &str,
    target: &FallbackTarget,
) -> Result<FallbackOutcome> {
    let reply = target
        .backend
        .handler()
        .exchange(client, &target.device_name, utterance)
        .await?;
    debug!(device = %target.device_name, backend = %target.backend, ?reply, "Fallback reply");

    Ok(match reply {
        BackendReply::Answer(answer) if answer.trim().is_empty() => FallbackOutcome::passed(),
        BackendReply::Answer(answer) => FallbackOutcome::answered(answer),
        BackendReply::Acknowledged => FallbackOutcome::acknowledged(),
        BackendReply::Passed => FallbackOutcome::passed(),
    })
}
