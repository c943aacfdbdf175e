//! Intents the host recognizes but FHEM control does not cover yet
//!
//! Brightness needs a per-module dim command and automations have no common
//! trigger in FHEM, so these answer with the not-supported dialog.

use crate::error::Result;
use crate::tools::{dialog, DialogResponse, IntentSlots, ToolContext};
use tracing::info;

fn not_supported(intent: &str, slots: &IntentSlots) -> Result<DialogResponse> {
    info!(intent, device = ?slots.device, "Intent not supported");
    Ok(DialogResponse::new(dialog::NOT_SUPPORTED))
}

pub async fn handle_light_set(_context: ToolContext, slots: IntentSlots) -> Result<DialogResponse> {
    not_supported("light_set", &slots)
}

pub async fn handle_light_adjust(_context: ToolContext, slots: IntentSlots) -> Result<DialogResponse> {
    not_supported("light_adjust", &slots)
}

pub async fn handle_automation(_context: ToolContext, slots: IntentSlots) -> Result<DialogResponse> {
    not_supported("automation", &slots)
}
