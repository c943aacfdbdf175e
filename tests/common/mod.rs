//! Common test utilities

#![allow(dead_code)]

pub mod fhem_mock;
pub mod fixtures;
