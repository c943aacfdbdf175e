//! Command execution
//!
//! Every write the core performs ends up here as a single FHEM command.

use crate::client::{FhemClient, FhemResponse};
use crate::error::Result;
use tracing::info;

/// Escape free text for a FHEM command chain, where `;` separates commands
pub fn escape_text(text: &str) -> String {
    text.replace(';', ";;")
}

/// Issue `set <target> <text>` with `text` escaped
pub async fn set_text(client: &dyn FhemClient, target: &str, text: &str) -> Result<FhemResponse> {
    set(client, target, &escape_text(text)).await
}

/// Issue `set <target> <args>`
pub async fn set(client: &dyn FhemClient, target: &str, args: &str) -> Result<FhemResponse> {
    raw(client, &format!("set {target} {args}")).await
}

/// Issue a command verbatim
pub async fn raw(client: &dyn FhemClient, command: &str) -> Result<FhemResponse> {
    info!(command, "Sending FHEM command");
    client.send_cmd(command).await
}
