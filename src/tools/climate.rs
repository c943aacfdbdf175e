//! Thermostat target temperature
//!
//! The device is resolved like any other, then re-read so the protocol is
//! classified from fresh data. Requests outside the device's bounds or off
//! its step grid are answered with the bounds and never clamped.

use crate::client::DeviceClassFilter;
use crate::error::{FhemError, Result};
use crate::services::{executor, resolver, thermostat};
use crate::tools::{dialog, DialogResponse, IntentSlots, ToolContext};
use tracing::debug;

/// Set a thermostat's target temperature
pub async fn handle_set_thermostat(context: ToolContext, slots: IntentSlots) -> Result<DialogResponse> {
    let device = slots.device()?;
    let requested = slots.value()?;
    let config = &context.config;
    let client = context.client();

    let resolved = resolver::resolve(
        client,
        device,
        &config.room,
        &DeviceClassFilter::thermostats(),
        &config.ignore_rooms,
    )
    .await?
    .ok_or_else(|| FhemError::entity_not_found(device))?;

    let entity = client
        .get_device(&resolved.entity_id)
        .await?
        .ok_or_else(|| FhemError::entity_not_found(device))?;

    let protocol = thermostat::classify(&entity)?;
    let value = protocol.validate_text(requested)?;
    let target = protocol.target(&resolved.entity_id);
    debug!(entity = target, setting = %protocol.setting_key, value, "Setting thermostat");

    executor::set(client, target, &format!("{} {}", protocol.setting_key, value)).await?;

    Ok(DialogResponse::new(dialog::SET_THERMOSTAT)
        .with("dev_name", &resolved.display_name)
        .with("value", value)
        .with("unit", ""))
}
