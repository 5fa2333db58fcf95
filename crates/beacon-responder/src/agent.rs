//! The response state machine.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use beacon_audit::{AuditError, AuditKind, AuditSink};
use beacon_transport::{Mailbox, MessageBus};
use beacon_types::{wire, AgentId, Envelope, Hazard, HazardEvent, MessageTag};

/// Response phases. `Monitoring` is both the initial state and the only
/// state an agent may be stopped from without losing in-flight work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Monitoring,
    Assessing,
    Dispatching,
    Confirming,
}

/// Per-instance session state, owned exclusively by one responder and
/// cleared on completing `Confirming`. An abort mid-`Dispatching` leaves
/// the event in place so it stays available for audit.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub last_report: Option<String>,
    pub current_event: Option<HazardEvent>,
}

#[derive(Clone, Debug)]
pub struct ResponderConfig {
    /// Bounded wait for a report while monitoring.
    pub receive_timeout: Duration,
    /// Simulated response latency between acting and confirming.
    pub response_delay: Duration,
    /// Optional dispatch counterpart: where to send the response
    /// instruction as a request message.
    pub field_unit: Option<AgentId>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_secs(10),
            response_delay: Duration::from_secs(3),
            field_unit: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Fixed response instruction per hazard category.
fn action_for(hazard: &Hazard) -> &'static str {
    match hazard {
        Hazard::Flood => "Deploy sandbags; evacuate low-lying zones",
        Hazard::Fire => "Dispatch fire team; isolate area; cut power supply",
        Hazard::Earthquake => "Send rescue team; initiate medical triage",
        Hazard::Other(_) => "Dispatch general emergency response",
    }
}

/// One responder instance. Processes one report fully before accepting the
/// next; audit lines therefore emit in strict transition order.
pub struct ResponderAgent {
    id: AgentId,
    config: ResponderConfig,
    mailbox: Mailbox,
    bus: MessageBus,
    audit: Arc<dyn AuditSink>,
    session: SessionState,
}

impl ResponderAgent {
    pub fn new(
        id: AgentId,
        config: ResponderConfig,
        mailbox: Mailbox,
        bus: MessageBus,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            id,
            config,
            mailbox,
            bus,
            audit,
            session: SessionState::default(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Execute exactly one phase and return the next.
    pub async fn step(&mut self, phase: Phase) -> Result<Phase, ResponderError> {
        match phase {
            Phase::Monitoring => self.monitor().await,
            Phase::Assessing => self.assess(),
            Phase::Dispatching => self.dispatch().await,
            Phase::Confirming => self.confirm(),
        }
    }

    /// Wait (bounded) for a sensor report. A timeout is the expected idle
    /// case and stays silent; foreign traffic is audited and passed over.
    async fn monitor(&mut self) -> Result<Phase, ResponderError> {
        let Some(message) = self.mailbox.recv_deadline(self.config.receive_timeout).await else {
            return Ok(Phase::Monitoring);
        };

        if message.tag != MessageTag::SensorReport {
            self.audit.append(
                AuditKind::Warn,
                &format!(
                    "ignoring message tag={} from={}",
                    message.tag, message.sender
                ),
            )?;
            return Ok(Phase::Monitoring);
        }

        self.audit.append(
            AuditKind::Report,
            &format!("sensor report from {}", message.sender),
        )?;
        self.session.last_report = Some(message.body);
        Ok(Phase::Assessing)
    }

    /// The single escalation gate: parse the stored report and evaluate the
    /// emergency predicate. A malformed report is audited and discarded,
    /// never fatal.
    fn assess(&mut self) -> Result<Phase, ResponderError> {
        let Some(raw) = self.session.last_report.as_deref() else {
            self.audit
                .append(AuditKind::Warn, "assessing with no stored report")?;
            return Ok(Phase::Monitoring);
        };

        let event = match wire::parse_report(raw) {
            Ok(event) => event,
            Err(err) => {
                self.audit
                    .append(AuditKind::Warn, &format!("malformed report discarded: {err}"))?;
                self.session.last_report = None;
                return Ok(Phase::Monitoring);
            }
        };

        self.audit.append(
            AuditKind::Classified,
            &format!(
                "hazard={} severity={} score={:.1}",
                event.hazard, event.severity, event.score
            ),
        )?;

        let escalate = event.severity.is_emergency();
        self.session.current_event = Some(event);
        if escalate {
            Ok(Phase::Dispatching)
        } else {
            Ok(Phase::Monitoring)
        }
    }

    /// Select and execute the canned response, then hold for the simulated
    /// response latency. Unconditional pass-through to `Confirming` so the
    /// audit trail distinguishes "acted" from "finished".
    async fn dispatch(&mut self) -> Result<Phase, ResponderError> {
        let Some(event) = self.session.current_event.clone() else {
            self.audit
                .append(AuditKind::Warn, "dispatching with no current event")?;
            return Ok(Phase::Monitoring);
        };

        let action = action_for(&event.hazard);
        self.audit.append(
            AuditKind::Action,
            &format!(
                "{} {} score={:.1} {}",
                event.hazard, event.severity, event.score, action
            ),
        )?;
        info!(
            responder = %self.id,
            hazard = %event.hazard,
            severity = %event.severity,
            "response action executed"
        );

        if let Some(unit) = &self.config.field_unit {
            let task = Envelope::request(
                self.id.clone(),
                unit.clone(),
                MessageTag::ResponseTask,
                format!(
                    "TASK: Respond to {}; severity={}; {}",
                    event.hazard, event.severity, action
                ),
            );
            if let Err(err) = self.bus.send(task).await {
                self.audit
                    .append(AuditKind::Warn, &format!("task delivery failed: {err}"))?;
                warn!(responder = %self.id, error = %err, "field unit unreachable");
            }
        }

        tokio::time::sleep(self.config.response_delay).await;
        Ok(Phase::Confirming)
    }

    /// Log completion with the original detail string and reset the session.
    fn confirm(&mut self) -> Result<Phase, ResponderError> {
        let Some(event) = self.session.current_event.take() else {
            self.audit
                .append(AuditKind::Warn, "confirming with no current event")?;
            return Ok(Phase::Monitoring);
        };

        self.audit.append(
            AuditKind::Done,
            &format!(
                "{} {} score={:.1} {}",
                event.hazard, event.severity, event.score, event.details
            ),
        )?;
        self.session.last_report = None;
        Ok(Phase::Monitoring)
    }

    /// Run the machine until shutdown. Shutdown aborts a pending receive or
    /// response delay without touching the stored session state.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut phase = Phase::Monitoring;
        info!(responder = %self.id, "response loop started");

        loop {
            tokio::select! {
                next = self.step(phase) => match next {
                    Ok(next) => phase = next,
                    Err(err) => {
                        warn!(responder = %self.id, error = %err, "phase failed");
                        phase = Phase::Monitoring;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(responder = %self.id, phase = ?phase, "response loop stopped");
    }
}
