//! Thermostat protocol classification
//!
//! FHEM has no common thermostat schema. Each device family exposes its
//! target temperature under a different reading with different limits, so
//! the protocol is derived from the entity's readings, internals and
//! attributes on every climate request.
//!
//! Rules are evaluated in order and the first applicable one wins. Several
//! rules can apply to the same entity.

use crate::client::FhemEntity;
use crate::error::{FhemError, Result};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_MIN: f64 = 5.0;
pub const DEFAULT_MAX: f64 = 35.0;
pub const DEFAULT_STEP: f64 = 0.5;

/// Tolerance for the step check, absorbs binary float noise
const STEP_EPSILON: f64 = 1e-9;

/// `FBTYPE` reading of AVM DECT radiator controllers
const COMET_DECT: &str = "Comet DECT";

/// How to set the target temperature of one device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermostatProtocol {
    /// Setting written with `set <target> <key> <value>`
    pub setting_key: String,
    /// Entity that actually receives the command, if not the resolved one
    pub target_entity: Option<String>,
    pub min_value: f64,
    pub max_value: f64,
    pub step_value: f64,
}

impl ThermostatProtocol {
    fn with_bounds(setting_key: &str, min_value: f64, max_value: f64) -> Self {
        Self {
            setting_key: setting_key.to_string(),
            target_entity: None,
            min_value,
            max_value,
            step_value: DEFAULT_STEP,
        }
    }

    fn with_defaults(setting_key: &str) -> Self {
        Self::with_bounds(setting_key, DEFAULT_MIN, DEFAULT_MAX)
    }

    /// Entity to send the command to
    pub fn target<'a>(&'a self, resolved: &'a str) -> &'a str {
        self.target_entity.as_deref().unwrap_or(resolved)
    }

    /// Check a requested temperature against bounds and step
    pub fn validate(&self, value: f64) -> Result<f64> {
        let steps = value / self.step_value;
        let on_step = (steps - steps.round()).abs() < STEP_EPSILON;

        if !value.is_finite() || value < self.min_value || value > self.max_value || !on_step {
            return Err(FhemError::out_of_range(
                value,
                self.min_value,
                self.max_value,
                self.step_value,
            ));
        }
        Ok(value)
    }

    /// Parse and validate a spoken temperature
    pub fn validate_text(&self, value: &str) -> Result<f64> {
        let parsed = value.trim().replace(',', ".").parse::<f64>().map_err(|_| {
            FhemError::out_of_range(f64::NAN, self.min_value, self.max_value, self.step_value)
        })?;
        self.validate(parsed)
    }
}

type Applies = fn(&FhemEntity) -> bool;
type Derive = fn(&FhemEntity) -> Result<ThermostatProtocol>;

/// Ordered classification rules
static CLIMATE_RULES: &[(&str, Applies, Derive)] = &[
    ("desired-temp", has_desired_temp, desired_temp_protocol),
    ("desiredTemperature", has_desired_temperature, max_protocol),
    ("desired", has_desired, pid_protocol),
    ("homebridgeMapping", has_homebridge_mapping, homebridge_protocol),
];

fn has_desired_temp(entity: &FhemEntity) -> bool {
    entity.reading("desired-temp").is_some()
}

fn has_desired_temperature(entity: &FhemEntity) -> bool {
    entity.reading("desiredTemperature").is_some()
}

fn has_desired(entity: &FhemEntity) -> bool {
    entity.reading("desired").is_some()
}

fn has_homebridge_mapping(entity: &FhemEntity) -> bool {
    entity.attribute("homebridgeMapping").is_some()
}

fn desired_temp_protocol(entity: &FhemEntity) -> Result<ThermostatProtocol> {
    if entity.reading_text("FBTYPE").as_deref() == Some(COMET_DECT) {
        return Ok(ThermostatProtocol::with_bounds("desired-temp", 8.0, 28.0));
    }

    match entity.device_type() {
        Some("FHT") => Ok(ThermostatProtocol::with_bounds("desired-temp", 6.0, 30.0)),
        Some("CUL_HM") => {
            // HomeMatic thermostats take the command on their climate channel
            let mut protocol = ThermostatProtocol::with_defaults("desired-temp");
            protocol.target_entity = entity.internal("channel_04").map(str::to_string);
            Ok(protocol)
        }
        _ => Ok(ThermostatProtocol::with_defaults("desired-temp")),
    }
}

fn max_protocol(_: &FhemEntity) -> Result<ThermostatProtocol> {
    Ok(ThermostatProtocol::with_bounds("desiredTemperature", 4.5, 30.5))
}

fn pid_protocol(_: &FhemEntity) -> Result<ThermostatProtocol> {
    Ok(ThermostatProtocol::with_defaults("desired"))
}

fn homebridge_protocol(entity: &FhemEntity) -> Result<ThermostatProtocol> {
    let mapping = entity.attribute("homebridgeMapping").unwrap_or_default();
    parse_homebridge_mapping(mapping)
}

fn parse_bound(term: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FhemError::malformed(format!("homebridgeMapping: non-numeric {term}={value}")))
}

/// Parse the `TargetTemperature` clause of a homebridgeMapping attribute, e.g.
/// `TargetTemperature=desired-temp::desired-temp,minValue=5,maxValue=35,minStep=0.5`
pub fn parse_homebridge_mapping(mapping: &str) -> Result<ThermostatProtocol> {
    let clause = mapping
        .split_whitespace()
        .find_map(|clause| clause.strip_prefix("TargetTemperature="))
        .ok_or_else(|| FhemError::not_supported("homebridgeMapping without TargetTemperature"))?;

    let mut protocol: Option<ThermostatProtocol> = None;
    let mut min_value = DEFAULT_MIN;
    let mut max_value = DEFAULT_MAX;
    let mut step_value = DEFAULT_STEP;

    for term in clause.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match term.split_once('=') {
            Some(("minValue", value)) => min_value = parse_bound("minValue", value)?,
            Some(("maxValue", value)) => max_value = parse_bound("maxValue", value)?,
            Some(("minStep", value)) => step_value = parse_bound("minStep", value)?,
            Some(_) => {}
            None if protocol.is_none() => {
                let mut parts = term.split(':');
                let key = parts.next().unwrap_or_default().trim();
                if key.is_empty() {
                    return Err(FhemError::malformed("homebridgeMapping: empty setting key"));
                }
                let mut found = ThermostatProtocol::with_defaults(key);
                found.target_entity = parts
                    .next()
                    .map(str::trim)
                    .filter(|target| !target.is_empty())
                    .map(str::to_string);
                protocol = Some(found);
            }
            None => {}
        }
    }

    let mut protocol = protocol
        .ok_or_else(|| FhemError::malformed("homebridgeMapping: TargetTemperature without setting key"))?;

    if min_value > max_value {
        return Err(FhemError::malformed(format!(
            "homebridgeMapping: minValue {min_value} above maxValue {max_value}"
        )));
    }
    if step_value <= 0.0 {
        return Err(FhemError::malformed(format!(
            "homebridgeMapping: minStep {step_value} not positive"
        )));
    }

    protocol.min_value = min_value;
    protocol.max_value = max_value;
    protocol.step_value = step_value;
    Ok(protocol)
}

/// Determine the thermostat protocol of an entity
pub fn classify(entity: &FhemEntity) -> Result<ThermostatProtocol> {
    for (rule, applies, derive) in CLIMATE_RULES {
        if applies(entity) {
            let protocol = derive(entity)?;
            debug!(entity = %entity.name, rule, ?protocol, "Classified thermostat");
            return Ok(protocol);
        }
    }

    Err(FhemError::not_supported(format!(
        "{} has no known thermostat protocol",
        entity.name
    )))
}
