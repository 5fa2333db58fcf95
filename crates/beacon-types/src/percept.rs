//! Environmental percepts and their wire-level detail rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One immutable snapshot of environmental readings.
///
/// Construction clamps every reading into its valid range, so a percept in
/// hand can never produce an out-of-range hazard score downstream.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Percept {
    /// Water level in centimetres, clamped to [0, 200].
    pub water_level_cm: f64,
    /// Temperature in degrees Celsius, clamped to [10, 60].
    pub temperature_c: f64,
    /// Smoke concentration in ppm, clamped to [0, 500].
    pub smoke_ppm: f64,
    /// Tremor index on a 0-10 scale.
    pub tremor_index: f64,
}

impl Percept {
    pub fn new(water_level_cm: f64, temperature_c: f64, smoke_ppm: f64, tremor_index: f64) -> Self {
        Self {
            water_level_cm: water_level_cm.clamp(0.0, 200.0),
            temperature_c: temperature_c.clamp(10.0, 60.0),
            smoke_ppm: smoke_ppm.clamp(0.0, 500.0),
            tremor_index: tremor_index.clamp(0.0, 10.0),
        }
    }

    /// The canonical detail rendering carried inside a report body.
    pub fn details(&self) -> PerceptDetails {
        PerceptDetails::from_percept(self)
    }
}

/// The `key=value` detail map of a report, kept in its raw comma-delimited
/// form so a parsed report reconstructs byte-for-byte to what was logged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptDetails(String);

impl PerceptDetails {
    /// Canonical rendering: fixed key order, one decimal for readings,
    /// two for the tremor index.
    pub fn from_percept(percept: &Percept) -> Self {
        Self(format!(
            "water={:.1},temp={:.1},smoke={:.1},tremor={:.2}",
            percept.water_level_cm, percept.temperature_c, percept.smoke_ppm, percept.tremor_index
        ))
    }

    /// Wrap a raw details field as received off the wire. Tolerant: unknown
    /// keys and foreign formats are preserved verbatim.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Iterate the `key=value` pairs. Pieces without `=` yield an empty value.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .split(',')
            .map(|piece| piece.split_once('=').unwrap_or((piece, "")))
    }

    /// Look up a single key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PerceptDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
