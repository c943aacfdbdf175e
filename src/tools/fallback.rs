//! Fallback intent: hand the raw utterance to FHEM's conversational module

use crate::error::FhemError;
use crate::log_structured_error;
use crate::services::fallback::{self, FallbackOutcome};
use crate::tools::{dialog, DialogResponse, ToolContext};
use serde::Serialize;
use tracing::debug;

/// Fallback result for the host
///
/// When handled, the host speaks `outcome.answer` and keeps listening if
/// `outcome.is_question` is set. `dialog` carries an error answer for a
/// non-handled turn the user should still hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackReply {
    pub outcome: FallbackOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialog: Option<DialogResponse>,
}

impl FallbackReply {
    fn silent(outcome: FallbackOutcome) -> Self {
        Self { outcome, dialog: None }
    }

    fn with_dialog(dialog: DialogResponse) -> Self {
        Self {
            outcome: FallbackOutcome::passed(),
            dialog: Some(dialog),
        }
    }

    pub fn setup_error() -> Self {
        Self::with_dialog(DialogResponse::new(dialog::SETUP_ERROR))
    }
}

/// Forward an utterance to the configured fallback device, if any
pub async fn handle_fallback(context: ToolContext, utterance: &str, turn_id: &str) -> FallbackReply {
    let Some(target) = context.config.fallback.as_ref() else {
        debug!("Fallback not enabled");
        return FallbackReply::silent(FallbackOutcome::passed());
    };

    match fallback::dispatch(context.client(), utterance, target).await {
        Ok(outcome) => FallbackReply::silent(outcome),
        Err(e) => {
            log_structured_error!(e, "tools", "fallback", turn_id);
            match e {
                FhemError::BackendUnavailable(_) => FallbackReply::with_dialog(DialogResponse::from_error(&e)),
                _ => FallbackReply::silent(FallbackOutcome::passed()),
            }
        }
    }
}
