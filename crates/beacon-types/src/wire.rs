//! The sensor report wire contract.
//!
//! A report body is UTF-8 text with exactly five logical fields:
//!
//! ```text
//! timestamp|hazard|severity|score|details
//! ```
//!
//! The split is `splitn(5, '|')`, so the fifth field runs to the end of the
//! line and a details blob containing `|` stays whole. Rendering and parsing
//! must round-trip: `parse_report(render_report(e))` equals `e` in all five
//! logical fields.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::event::HazardEvent;
use crate::hazard::{Hazard, Severity};
use crate::percept::PerceptDetails;

/// Timestamp rendering shared by the wire contract and the audit log.
pub const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Wire-level parse failures. All of these are the malformed-report path:
/// recovered locally by the consumer, never fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("report has {found} fields, expected at least 5")]
    TooFewFields { found: usize },

    #[error("unparsable report timestamp '{0}'")]
    BadTimestamp(String),

    #[error("unknown severity tier '{0}'")]
    BadSeverity(String),

    #[error("unparsable score '{0}'")]
    BadScore(String),
}

/// Render an event into its report body.
pub fn render_report(event: &HazardEvent) -> String {
    format!(
        "{}|{}|{}|{:.1}|{}",
        event.timestamp.format(WIRE_TIMESTAMP_FORMAT),
        event.hazard,
        event.severity,
        event.score,
        event.details
    )
}

/// Parse a report body back into an event.
///
/// The transmitted severity tier is carried verbatim rather than recomputed,
/// so the consumer audits exactly what the producer claimed.
pub fn parse_report(body: &str) -> Result<HazardEvent, WireError> {
    let fields: Vec<&str> = body.splitn(5, '|').collect();
    if fields.len() < 5 {
        return Err(WireError::TooFewFields {
            found: fields.len(),
        });
    }

    let timestamp = NaiveDateTime::parse_from_str(fields[0], WIRE_TIMESTAMP_FORMAT)
        .map_err(|_| WireError::BadTimestamp(fields[0].to_string()))?
        .and_utc();
    let hazard = Hazard::parse_token(fields[1]);
    let severity: Severity = fields[2]
        .parse()
        .map_err(|_| WireError::BadSeverity(fields[2].to_string()))?;
    let score: f64 = fields[3]
        .parse()
        .map_err(|_| WireError::BadScore(fields[3].to_string()))?;

    Ok(HazardEvent {
        timestamp,
        hazard,
        severity,
        score,
        details: PerceptDetails::from_raw(fields[4]),
    })
}
