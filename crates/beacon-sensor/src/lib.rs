//! Sensor role: samples percepts on a fixed period, classifies them, and
//! reports hazard events to the configured responder.

#![deny(unsafe_code)]

mod agent;
mod environment;

pub use agent::{ReportMode, SensorAgent, SensorConfig, SensorError};
pub use environment::{DriftEnvironment, PerceptSource};
