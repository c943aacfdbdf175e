//! FHEM voice bridge - command line entry point
//!
//! Handles one intent per invocation and prints the answer as JSON, which
//! makes it usable both for testing a setup and from shell-based hosts.

use clap::{Parser, Subcommand};
use fhem_voice_rust::{
    config::default_settings_path,
    error::ErrorReporter,
    logging::{init_logging, LogConfig},
    IntentKind, IntentRouter, IntentSlots, Result, SessionHandle, SkillSettings,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// FHEM voice bridge
#[derive(Parser, Debug)]
#[command(name = "fhem-voice")]
#[command(about = "Resolve spoken device names and control FHEM")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    intent: IntentCommand,

    /// Settings file (TOML); defaults to the user config directory
    #[arg(long, global = true, env = "FHEM_VOICE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum IntentCommand {
    /// Switch a light, switch or outlet
    Switch {
        #[arg(long)]
        device: String,
        /// Action word, e.g. "on", "off" or "toggle"
        #[arg(long, default_value = "")]
        action: String,
    },
    /// Read out a sensor
    Sensor {
        #[arg(long)]
        device: String,
    },
    /// Ask where a resident is
    Presence {
        #[arg(long)]
        name: String,
    },
    /// Set a thermostat's target temperature
    Climate {
        #[arg(long)]
        device: String,
        #[arg(long)]
        temp: String,
    },
    /// Set a light's brightness
    LightSet {
        #[arg(long, default_value = "")]
        device: String,
        #[arg(long)]
        value: Option<String>,
    },
    /// Brighten or dim a light
    LightAdjust {
        #[arg(long, default_value = "")]
        device: String,
    },
    /// Trigger an automation, scene or script
    Automation {
        #[arg(long, default_value = "")]
        entity: String,
    },
    /// Forward free text to the conversational fallback device
    Fallback {
        #[arg(long)]
        utterance: String,
    },
    /// Connect and report backend health
    Check,
}

impl IntentCommand {
    fn intent(self) -> Option<(IntentKind, IntentSlots)> {
        let intent = match self {
            Self::Switch { device, action } => {
                (IntentKind::Switch, IntentSlots::new(device).with_action(action))
            }
            Self::Sensor { device } => (IntentKind::Sensor, IntentSlots::new(device)),
            Self::Presence { name } => (IntentKind::Presence, IntentSlots::new(name)),
            Self::Climate { device, temp } => {
                (IntentKind::Climate, IntentSlots::new(device).with_value(temp))
            }
            Self::LightSet { device, value } => {
                let mut slots = IntentSlots::new(device);
                slots.value = value;
                (IntentKind::LightSet, slots)
            }
            Self::LightAdjust { device } => (IntentKind::LightAdjust, IntentSlots::new(device)),
            Self::Automation { entity } => (IntentKind::Automation, IntentSlots::new(entity)),
            Self::Fallback { .. } | Self::Check => return None,
        };
        Some(intent)
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LogConfig::from_env().with_debug(cli.debug)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let settings_path = cli.config.clone().or_else(default_settings_path);
    debug!(path = ?settings_path, "Loading settings");
    let settings = SkillSettings::load(cli.config.as_deref())?;

    let sessions = Arc::new(SessionHandle::new());
    let setup_error = sessions.reload(&settings).await.err();
    if let Some(e) = &setup_error {
        // Intents still answer, with the setup or offline dialog
        ErrorReporter::log_error(e, None);
    }

    if let IntentCommand::Check = cli.intent {
        let Some(session) = sessions.current().await else {
            let mut report = serde_json::json!({ "connected": false });
            if let Some(e) = &setup_error {
                report["error"] = ErrorReporter::format_error(e)["error"].clone();
            }
            return print_json(&report);
        };
        let healthy = session.client.health_check().await.unwrap_or(false);
        return print_json(&serde_json::json!({
            "connected": true,
            "healthy": healthy,
            "room": session.config.room,
            "fallback": session.config.fallback,
        }));
    }

    let router = IntentRouter::new(sessions);

    if let IntentCommand::Fallback { utterance } = &cli.intent {
        let reply = router.fallback(utterance).await;
        info!(handled = reply.outcome.handled, "Fallback finished");
        return print_json(&reply);
    }

    if let Some((kind, slots)) = cli.intent.intent() {
        let response = router.handle(kind, slots).await;
        print_json(&response)?;
    }

    Ok(())
}
