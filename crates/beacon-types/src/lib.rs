//! Beacon domain types.
//!
//! Shared vocabulary for the sensing and response roles:
//! - `Percept`: one clamped snapshot of environmental readings
//! - `Hazard` / `Severity`: the classified disaster category and urgency tier
//! - `HazardEvent`: a classified, timestamped hazard record
//! - `wire`: the pipe-delimited report contract between sensor and responder
//! - `envelope`: routing metadata carried alongside a message body

#![deny(unsafe_code)]

pub mod envelope;
pub mod event;
pub mod hazard;
pub mod percept;
pub mod wire;

pub use envelope::{AgentId, Envelope, MessageTag, Performative};
pub use event::HazardEvent;
pub use hazard::{Hazard, Severity};
pub use percept::{Percept, PerceptDetails};
pub use wire::WireError;
