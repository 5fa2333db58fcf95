//! Classified hazard events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hazard::{Hazard, Severity};
use crate::percept::PerceptDetails;

/// A classified, timestamped hazard record ready for dispatch decisioning.
///
/// Immutable once created; a new event replaces it on the next cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardEvent {
    pub timestamp: DateTime<Utc>,
    pub hazard: Hazard,
    pub severity: Severity,
    pub score: f64,
    pub details: PerceptDetails,
}

impl HazardEvent {
    /// Build an event from a classification result. Severity is always
    /// recomputed from the score here; wire-parsed events instead carry the
    /// transmitted tier verbatim.
    pub fn classified(
        timestamp: DateTime<Utc>,
        hazard: Hazard,
        score: f64,
        details: PerceptDetails,
    ) -> Self {
        Self {
            timestamp,
            hazard,
            severity: Severity::from_score(score),
            score,
            details,
        }
    }
}
