//! FHEM voice bridge in Rust
//!
//! Resolves spoken device references against a live FHEM installation and
//! dispatches the resulting commands through FHEMWEB.
//!
//! # Features
//!
//! - Fuzzy device resolution tolerant of room qualifiers and naming noise
//! - Thermostat protocol detection across common FHEM device families
//! - Fallback to FHEM's conversational modules (TEERKO, Talk2Fhem, Babble)
//! - Switch, sensor, presence and climate intents answered with dialog keys

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod services;
pub mod tools;

// Test support modules - available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use client::{FhemClient, FhemEntity, Session, SessionHandle};
pub use config::{SessionConfig, SkillSettings};
pub use error::{FhemError, Result};
pub use tools::{DialogResponse, IntentKind, IntentRouter, IntentSlots};
