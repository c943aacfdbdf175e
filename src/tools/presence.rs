//! Roommate presence lookup

use crate::error::Result;
use crate::services::resolver;
use crate::tools::{dialog, DialogResponse, IntentSlots, ToolContext};

/// Tell where a resident is, based on FHEM ROOMMATE devices
pub async fn handle_presence(context: ToolContext, slots: IntentSlots) -> Result<DialogResponse> {
    let wanted = slots.device()?;
    let config = &context.config;

    let Some(found) = resolver::resolve_roommate(context.client(), wanted, &config.room).await? else {
        return Ok(DialogResponse::new(dialog::PRESENCE_ERROR));
    };
    if found.presence.trim().is_empty() {
        return Ok(DialogResponse::new(dialog::PRESENCE_ERROR));
    }

    Ok(DialogResponse::new(dialog::PRESENCE_FOUND)
        .with("wanted", &found.real_name)
        .with("location", config.vocabulary.presence_phrase(&found.presence)))
}
