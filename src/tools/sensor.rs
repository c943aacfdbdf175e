//! Sensor read-out

use crate::client::DeviceClassFilter;
use crate::config::vocabulary::{SensorQuantity, Vocabulary};
use crate::error::{FhemError, Result};
use crate::services::resolver;
use crate::tools::{dialog, DialogResponse, IntentSlots, ToolContext};

/// Make an FHEM state string like `T: 21.5 H: 48` speakable by replacing
/// quantity markers with their localized names
pub fn speakable_state(state: &str, vocabulary: &Vocabulary) -> String {
    state
        .split_whitespace()
        .map(|token| {
            SensorQuantity::from_token(token)
                .and_then(|quantity| vocabulary.sensor_term(quantity))
                .unwrap_or(token)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read out the state of a sensor or thermometer
pub async fn handle_sensor(context: ToolContext, slots: IntentSlots) -> Result<DialogResponse> {
    let device = slots.device()?;
    let config = &context.config;

    let resolved = resolver::resolve(
        context.client(),
        device,
        &config.room,
        &DeviceClassFilter::sensors(),
        &config.ignore_rooms,
    )
    .await?
    .ok_or_else(|| FhemError::entity_not_found(device))?;

    Ok(DialogResponse::new(dialog::SENSOR)
        .with("dev_name", &resolved.display_name)
        .with("value", speakable_state(&resolved.current_state, &config.vocabulary))
        .with("unit", ""))
}
