//! The dispatch counterpart: a field unit that acts on task requests.
//!
//! Consumes `ResponseTask` requests, triggers a unit keyed off the hazard
//! keyword in the instruction text, and replies with a `ResponseStatus`
//! inform. Instruction and status bodies pass through verbatim so the audit
//! trail quotes exactly what was exchanged.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use beacon_audit::{AuditKind, AuditSink};
use beacon_transport::{Mailbox, MessageBus};
use beacon_types::{AgentId, Envelope, MessageTag, Performative};

use crate::agent::ResponderError;

/// Unit selection by keyword scan over the instruction text.
fn unit_for(instruction: &str) -> &'static str {
    let upper = instruction.to_uppercase();
    if upper.contains("FIRE") {
        "DISPATCH FIRE UNIT"
    } else if upper.contains("FLOOD") {
        "DISPATCH FLOOD RESPONSE UNIT"
    } else if upper.contains("EARTHQUAKE") {
        "DISPATCH SEARCH & RESCUE UNIT"
    } else {
        "DISPATCH TEAM"
    }
}

pub struct FieldUnitAgent {
    id: AgentId,
    receive_timeout: Duration,
    mailbox: Mailbox,
    bus: MessageBus,
    audit: Arc<dyn AuditSink>,
}

impl FieldUnitAgent {
    pub fn new(
        id: AgentId,
        receive_timeout: Duration,
        mailbox: Mailbox,
        bus: MessageBus,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            id,
            receive_timeout,
            mailbox,
            bus,
            audit,
        }
    }

    /// One bounded receive plus handling. Timeout is the idle case.
    pub async fn poll(&mut self) -> Result<(), ResponderError> {
        let Some(message) = self.mailbox.recv_deadline(self.receive_timeout).await else {
            return Ok(());
        };

        let is_task =
            message.performative == Performative::Request && message.tag == MessageTag::ResponseTask;
        if !is_task {
            self.audit.append(
                AuditKind::Warn,
                &format!(
                    "ignoring message tag={} from={}",
                    message.tag, message.sender
                ),
            )?;
            return Ok(());
        }

        let unit = unit_for(&message.body);
        self.audit.append(
            AuditKind::Action,
            &format!("{unit} triggered by task from {}: {}", message.sender, message.body),
        )?;
        info!(field_unit = %self.id, unit, "unit dispatched");

        let status = format!("STATUS: {unit} completed; outcome=SUCCESS");
        let reply = Envelope::inform(
            self.id.clone(),
            message.sender.clone(),
            MessageTag::ResponseStatus,
            status.clone(),
        );
        match self.bus.send(reply).await {
            Ok(()) => {
                self.audit.append(
                    AuditKind::Status,
                    &format!("sent to {}: {status}", message.sender),
                )?;
            }
            Err(err) => {
                self.audit
                    .append(AuditKind::Warn, &format!("status delivery failed: {err}"))?;
                warn!(field_unit = %self.id, error = %err, "requester unreachable");
            }
        }

        Ok(())
    }

    /// Poll until shutdown.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(field_unit = %self.id, "field unit started");
        loop {
            tokio::select! {
                polled = self.poll() => {
                    if let Err(err) = polled {
                        warn!(field_unit = %self.id, error = %err, "poll failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(field_unit = %self.id, "field unit stopped");
    }
}
