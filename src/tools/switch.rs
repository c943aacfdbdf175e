//! On/off/toggle for lights, switches and outlets

use crate::client::DeviceClassFilter;
use crate::config::vocabulary::SwitchAction;
use crate::error::{FhemError, Result};
use crate::services::{executor, resolver};
use crate::tools::{dialog, DialogResponse, IntentSlots, ToolContext};
use tracing::debug;

/// Switch a device on, off, or to the opposite of its current state
pub async fn handle_switch(context: ToolContext, slots: IntentSlots) -> Result<DialogResponse> {
    let device = slots.device()?;
    let spoken_action = slots.action();
    let config = &context.config;

    let resolved = resolver::resolve(
        context.client(),
        device,
        &config.room,
        &DeviceClassFilter::switchable(),
        &config.ignore_rooms,
    )
    .await?
    .ok_or_else(|| FhemError::entity_not_found(device))?;

    let action = config.vocabulary.switch_action(spoken_action);
    let command = match action {
        SwitchAction::On => "on",
        SwitchAction::Off => "off",
        SwitchAction::Toggle => {
            if resolved.current_state == "off" {
                "on"
            } else {
                "off"
            }
        }
        SwitchAction::Unrecognized => return Ok(DialogResponse::new(dialog::SORRY)),
    };
    debug!(device = %resolved.entity_id, state = %resolved.current_state, command, "Switch request");

    if action != SwitchAction::Toggle && resolved.current_state == command {
        return Ok(DialogResponse::new(dialog::ALREADY)
            .with("dev_name", &resolved.display_name)
            .with("action", spoken_action));
    }

    executor::set(context.client(), &resolved.entity_id, command).await?;

    Ok(DialogResponse::new(dialog::SWITCH)
        .with("dev_name", &resolved.display_name)
        .with("action", spoken_action))
}
