//! Hazard scoring and classification.
//!
//! Pure functions from a percept to a typed hazard event:
//! - `score_board` computes the three per-hazard scores
//! - `ScoreBoard::dominant` selects the winning hazard with a fixed tie-break
//! - `classify` gates the dominant hazard on its publish threshold
//!
//! Two calls with identical inputs yield identical output; timestamps are
//! supplied by the caller so there is no hidden state and no I/O.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use beacon_types::{Hazard, HazardEvent, Percept};

// ── Scoring ──────────────────────────────────────────────────────────────

/// Per-hazard scores computed from one percept.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub flood: f64,
    pub fire: f64,
    pub quake: f64,
}

impl ScoreBoard {
    /// The winning hazard and its score.
    ///
    /// Tie-break is fixed: candidates are scanned in the order Flood, Fire,
    /// Earthquake and a later candidate must strictly exceed the running
    /// best, so on equal scores the earlier hazard wins.
    pub fn dominant(&self) -> (Hazard, f64) {
        let candidates = [
            (Hazard::Flood, self.flood),
            (Hazard::Fire, self.fire),
            (Hazard::Earthquake, self.quake),
        ];

        let mut best = candidates[0].clone();
        for candidate in &candidates[1..] {
            if candidate.1 > best.1 {
                best = candidate.clone();
            }
        }
        best
    }
}

/// Compute the three hazard scores:
///
/// - flood: the water level itself
/// - fire: smoke plus twice the temperature excess over 35 °C
/// - quake: the tremor index on a 0-100 scale
pub fn score_board(percept: &Percept) -> ScoreBoard {
    ScoreBoard {
        flood: percept.water_level_cm,
        fire: percept.smoke_ppm + ((percept.temperature_c - 35.0) * 2.0).max(0.0),
        quake: percept.tremor_index * 10.0,
    }
}

// ── Classification ───────────────────────────────────────────────────────

/// Minimum dominant score for a hazard to produce an event at all.
fn publish_threshold(hazard: &Hazard) -> f64 {
    match hazard {
        Hazard::Flood => 40.0,
        Hazard::Fire => 80.0,
        Hazard::Earthquake => 35.0,
        // The scorer never selects a foreign category; nothing publishes it.
        Hazard::Other(_) => f64::INFINITY,
    }
}

/// Classify a percept, gated on the dominant hazard's publish threshold.
///
/// `None` is the normal below-threshold outcome, not an error.
pub fn classify(percept: &Percept, at: DateTime<Utc>) -> Option<HazardEvent> {
    let (hazard, score) = score_board(percept).dominant();
    if score < publish_threshold(&hazard) {
        return None;
    }
    Some(HazardEvent::classified(
        at,
        hazard,
        round_score(score),
        percept.details(),
    ))
}

/// Classify with no threshold gate: always an event for the dominant
/// hazard. Used by the always-report sensor mode.
pub fn classify_unconditional(percept: &Percept, at: DateTime<Utc>) -> HazardEvent {
    let (hazard, score) = score_board(percept).dominant();
    HazardEvent::classified(at, hazard, round_score(score), percept.details())
}

/// Scores carry one decimal on the wire.
fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}
