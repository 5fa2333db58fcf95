//! Message envelopes: routing metadata carried alongside a body.
//!
//! The free-text ontology tag of the underlying protocol is decoded once,
//! at the message boundary, into the closed `MessageTag` enum; states never
//! compare raw strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Routable agent identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Speech-act class of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performative {
    /// Asks the recipient to act.
    Request,
    /// Reports a fact or outcome.
    Inform,
}

/// Decoded ontology tag. `Unrecognized` keeps the raw token so foreign
/// traffic can be audited before it is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageTag {
    SensorReport,
    ResponseTask,
    ResponseStatus,
    Unrecognized(String),
}

impl MessageTag {
    pub fn parse_token(token: &str) -> Self {
        match token {
            "sensor-report" => MessageTag::SensorReport,
            "response-task" => MessageTag::ResponseTask,
            "response-status" => MessageTag::ResponseStatus,
            other => MessageTag::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MessageTag::SensorReport => "sensor-report",
            MessageTag::ResponseTask => "response-task",
            MessageTag::ResponseStatus => "response-status",
            MessageTag::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One routed message: metadata plus an opaque body.
///
/// Bodies pass through verbatim: the transport and the consumers never
/// rewrite them, so audit lines can quote exactly what was sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub performative: Performative,
    pub tag: MessageTag,
    pub sender: AgentId,
    pub recipient: AgentId,
    pub body: String,
}

impl Envelope {
    pub fn inform(
        sender: AgentId,
        recipient: AgentId,
        tag: MessageTag,
        body: impl Into<String>,
    ) -> Self {
        Self {
            performative: Performative::Inform,
            tag,
            sender,
            recipient,
            body: body.into(),
        }
    }

    pub fn request(
        sender: AgentId,
        recipient: AgentId,
        tag: MessageTag,
        body: impl Into<String>,
    ) -> Self {
        Self {
            performative: Performative::Request,
            tag,
            sender,
            recipient,
            body: body.into(),
        }
    }
}
