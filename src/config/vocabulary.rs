//! Locale keyword tables
//!
//! The grammar layer hands over the user's literal words; these tables map
//! them onto canonical switch actions and render sensor and presence values
//! back into speakable phrases.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical meaning of a spoken switch action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchAction {
    On,
    Off,
    Toggle,
    Unrecognized,
}

/// Measurement kinds recognized in sensor state strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorQuantity {
    Temperature,
    Humidity,
    Pressure,
}

impl SensorQuantity {
    /// Classify a token from an FHEM state string like `T: 21.5 H: 40`
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_lowercase().replace(':', "").as_str() {
            "t" | "temp" | "temperatur" | "temperature" => Some(Self::Temperature),
            "h" | "hum" | "humidity" => Some(Self::Humidity),
            "p" | "pamb" | "press" | "pressure" => Some(Self::Pressure),
            _ => None,
        }
    }
}

/// Keyword tables for one language
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    pub on_keywords: Vec<String>,
    pub off_keywords: Vec<String>,
    pub toggle_keywords: Vec<String>,
    pub sensor_terms: HashMap<SensorQuantity, String>,
    /// ROOMMATE `presence` reading value to phrase
    pub presence_phrases: HashMap<String, String>,
}

/// Optional per-table overrides from the settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyOverrides {
    pub on_keywords: Option<Vec<String>>,
    pub off_keywords: Option<Vec<String>>,
    pub toggle_keywords: Option<Vec<String>>,
    pub presence_phrases: Option<HashMap<String, String>>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn phrases(list: &[(&str, &str)]) -> HashMap<String, String> {
    list.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Vocabulary {
    /// English tables
    pub fn english() -> Self {
        Self {
            on_keywords: words(&["on", "activate", "enable", "start"]),
            off_keywords: words(&["off", "deactivate", "disable", "stop"]),
            toggle_keywords: words(&["toggle", "switch"]),
            sensor_terms: HashMap::from([
                (SensorQuantity::Temperature, "temperature".to_string()),
                (SensorQuantity::Humidity, "humidity".to_string()),
                (SensorQuantity::Pressure, "pressure".to_string()),
            ]),
            presence_phrases: phrases(&[
                ("present", "at home"),
                ("absent", "not at home"),
                ("gone", "away"),
            ]),
        }
    }

    /// German tables
    pub fn german() -> Self {
        Self {
            on_keywords: words(&["an", "ein", "einschalten", "anschalten", "aktivieren"]),
            off_keywords: words(&["aus", "ausschalten", "abschalten", "deaktivieren"]),
            toggle_keywords: words(&["umschalten", "wechseln"]),
            sensor_terms: HashMap::from([
                (SensorQuantity::Temperature, "Temperatur".to_string()),
                (SensorQuantity::Humidity, "Luftfeuchtigkeit".to_string()),
                (SensorQuantity::Pressure, "Luftdruck".to_string()),
            ]),
            presence_phrases: phrases(&[
                ("present", "zu Hause"),
                ("absent", "nicht zu Hause"),
                ("gone", "verreist"),
            ]),
        }
    }

    /// Tables for a language tag such as `de-de`; unknown languages get English
    pub fn for_language(language: &str) -> Self {
        let primary = language
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match primary.as_str() {
            "de" => Self::german(),
            _ => Self::english(),
        }
    }

    /// Replace tables that the settings file overrides
    pub fn with_overrides(mut self, overrides: &VocabularyOverrides) -> Self {
        if let Some(on) = &overrides.on_keywords {
            self.on_keywords = on.clone();
        }
        if let Some(off) = &overrides.off_keywords {
            self.off_keywords = off.clone();
        }
        if let Some(toggle) = &overrides.toggle_keywords {
            self.toggle_keywords = toggle.clone();
        }
        if let Some(presence) = &overrides.presence_phrases {
            self.presence_phrases.extend(presence.clone());
        }
        self
    }

    /// Map a spoken action word onto its canonical meaning
    pub fn switch_action(&self, word: &str) -> SwitchAction {
        let word = word.trim().to_lowercase();
        let contains = |list: &[String]| list.iter().any(|k| k.to_lowercase() == word);

        if contains(&self.on_keywords) {
            SwitchAction::On
        } else if contains(&self.off_keywords) {
            SwitchAction::Off
        } else if contains(&self.toggle_keywords) {
            SwitchAction::Toggle
        } else {
            SwitchAction::Unrecognized
        }
    }

    /// Speakable name of a sensor quantity
    pub fn sensor_term(&self, quantity: SensorQuantity) -> Option<&str> {
        self.sensor_terms.get(&quantity).map(String::as_str)
    }

    /// Speakable phrase for a presence reading; unknown values are spoken verbatim
    pub fn presence_phrase(&self, value: &str) -> String {
        self.presence_phrases
            .get(value)
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::english()
    }
}
