//! Device resolution and command dispatch
//!
//! The intent handlers in `tools` only pick dialog keys; everything that
//! talks to FHEM or interprets its data lives here.

pub mod candidates;
pub mod executor;
pub mod fallback;
pub mod matching;
pub mod normalizer;
pub mod resolver;
pub mod thermostat;

pub use fallback::{FallbackBackend, FallbackOutcome};
pub use resolver::{PresenceMatch, ResolvedCandidate};
pub use thermostat::ThermostatProtocol;
