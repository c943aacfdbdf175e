//! Configuration management for the FHEM voice bridge
//!
//! `SkillSettings` mirrors the host's opaque settings surface. Everything the
//! resolution and dispatch core reads at runtime lives in `SessionConfig`,
//! which is built once per connection and never mutated afterwards.

pub mod credentials;
pub mod vocabulary;

use crate::error::{FhemError, Result};
use crate::services::fallback::FallbackBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub use credentials::FhemCredentials;
pub use vocabulary::{Vocabulary, VocabularyOverrides};

/// Default FHEMWEB port
pub const DEFAULT_PORT: u16 = 8083;

/// Room used when the host does not configure one
pub const DEFAULT_ROOM: &str = "Homebridge";

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "FHEM_VOICE";

/// Raw skill settings as delivered by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillSettings {
    /// FHEM server host name or address
    pub host: Option<String>,

    /// Port, kept as text because hosts deliver it unvalidated
    pub port: Option<String>,

    /// Protocol (`http` or `https`)
    pub protocol: String,

    /// Force TLS regardless of `protocol`
    pub ssl: bool,

    /// Basic auth user
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<String>,

    /// Active room; only entities in this room are considered
    pub room: String,

    /// Comma-separated rooms that never qualify a device name
    pub ignore_rooms: String,

    /// Forward unrecognized utterances to a conversational device
    pub enable_fallback: bool,

    /// Name of the conversational FHEM device
    pub fallback_device_name: String,

    /// Language for keyword tables
    pub language: String,

    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Keyword table overrides
    pub vocabulary: VocabularyOverrides,
}

impl Default for SkillSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            protocol: "http".to_string(),
            ssl: false,
            username: None,
            password: None,
            room: DEFAULT_ROOM.to_string(),
            ignore_rooms: String::new(),
            enable_fallback: false,
            fallback_device_name: String::new(),
            language: "en".to_string(),
            timeout: Duration::from_secs(10),
            vocabulary: VocabularyOverrides::default(),
        }
    }
}

impl SkillSettings {
    /// Load settings from defaults, an optional TOML file and `FHEM_VOICE_*`
    /// environment variables, in that order of precedence.
    ///
    /// Without an explicit path the default location is tried and silently
    /// skipped when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(::config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = default_settings_path() {
                    builder = builder.add_source(::config::File::from(default_path).required(false));
                }
            }
        }

        builder = builder.add_source(::config::Environment::with_prefix(ENV_PREFIX));

        let settings: SkillSettings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Host, failing when unset
    pub fn host(&self) -> Result<&str> {
        self.host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| FhemError::config("FHEM host is not configured"))
    }

    /// Port number; missing or empty falls back to the FHEMWEB default
    pub fn port(&self) -> Result<u16> {
        match self.port.as_deref().map(str::trim) {
            None | Some("") => Ok(DEFAULT_PORT),
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| FhemError::config(format!("Invalid port number: {raw}"))),
        }
    }

    /// URL scheme derived from `protocol` and `ssl`
    pub fn scheme(&self) -> Result<&'static str> {
        if self.ssl {
            return Ok("https");
        }
        match self.protocol.trim().to_lowercase().as_str() {
            "" | "http" => Ok("http"),
            "https" => Ok("https"),
            other => Err(FhemError::config(format!("Unsupported protocol: {other}"))),
        }
    }

    /// FHEMWEB base URL, e.g. `http://fhem.local:8083/fhem`
    pub fn base_url(&self) -> Result<Url> {
        let raw = format!("{}://{}:{}/fhem", self.scheme()?, self.host()?, self.port()?);
        Url::parse(&raw).map_err(|e| FhemError::config(format!("Invalid FHEM URL {raw}: {e}")))
    }

    /// Lower-cased ignored rooms
    pub fn ignored_rooms(&self) -> Vec<String> {
        parse_room_list(&self.ignore_rooms)
    }

    /// Configured fallback device name, if fallback is switched on
    pub fn fallback_device(&self) -> Option<&str> {
        let name = self.fallback_device_name.trim();
        (self.enable_fallback && !name.is_empty()).then_some(name)
    }

    /// Vocabulary for the configured language with overrides applied
    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::for_language(&self.language).with_overrides(&self.vocabulary)
    }
}

/// Default settings file location
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fhem-voice").join("settings.toml"))
}

/// Split a comma-separated room list into trimmed, lower-cased names
pub fn parse_room_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|room| room.trim().to_lowercase())
        .filter(|room| !room.is_empty())
        .collect()
}

/// Conversational device used for unrecognized utterances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackTarget {
    /// FHEM device name
    pub device_name: String,
    /// Wire convention of that device
    pub backend: FallbackBackend,
}

/// Immutable per-connection view of the settings
///
/// Rebuilt wholesale whenever the host reports a settings change.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Active room, as configured
    pub room: String,
    /// Lower-cased rooms that never qualify a device name
    pub ignore_rooms: Vec<String>,
    /// Fallback device, when enabled and recognized
    pub fallback: Option<FallbackTarget>,
    /// Keyword tables
    pub vocabulary: Vocabulary,
}

impl SessionConfig {
    /// Build from settings; fallback detection needs the backend and is
    /// supplied by the caller
    pub fn from_settings(settings: &SkillSettings, fallback: Option<FallbackTarget>) -> Self {
        let room = match settings.room.trim() {
            "" => DEFAULT_ROOM.to_string(),
            room => room.to_string(),
        };

        Self {
            room,
            ignore_rooms: settings.ignored_rooms(),
            fallback,
            vocabulary: settings.vocabulary(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_settings(&SkillSettings::default(), None)
    }
}
