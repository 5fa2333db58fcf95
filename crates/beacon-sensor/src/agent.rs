//! The periodic sensor loop.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use beacon_audit::{AuditError, AuditKind, AuditSink};
use beacon_classifier::{classify, classify_unconditional};
use beacon_transport::{MessageBus, TransportError};
use beacon_types::{wire, AgentId, Envelope, HazardEvent, MessageTag};

use crate::environment::PerceptSource;

/// Whether a tick reports only above-threshold classifications or the
/// dominant classification unconditionally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReportMode {
    #[default]
    AboveThreshold,
    Always,
}

impl FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "above-threshold" => Ok(ReportMode::AboveThreshold),
            "always" => Ok(ReportMode::Always),
            other => Err(format!(
                "unknown report mode '{other}' (expected 'above-threshold' or 'always')"
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SensorConfig {
    /// Who receives the reports.
    pub recipient: AgentId,
    /// Sampling and report period.
    pub period: Duration,
    pub mode: ReportMode,
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// One sensor instance: every tick it samples, classifies, reports, and audits.
pub struct SensorAgent {
    id: AgentId,
    config: SensorConfig,
    source: Box<dyn PerceptSource>,
    bus: MessageBus,
    audit: Arc<dyn AuditSink>,
}

impl SensorAgent {
    pub fn new(
        id: AgentId,
        config: SensorConfig,
        source: Box<dyn PerceptSource>,
        bus: MessageBus,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            id,
            config,
            source,
            bus,
            audit,
        }
    }

    /// One sampling tick. Exactly one audit line always; one outbound
    /// report when the classification clears the gate (or unconditionally
    /// in always-report mode). A failed send is audited and surfaced to
    /// the caller; retry policy belongs to the transport collaborator.
    pub async fn tick(&mut self) -> Result<Option<HazardEvent>, SensorError> {
        let percept = self.source.sample();
        let now = chrono::Utc::now();

        let event = match self.config.mode {
            ReportMode::AboveThreshold => classify(&percept, now),
            ReportMode::Always => Some(classify_unconditional(&percept, now)),
        };

        let Some(event) = event else {
            self.audit
                .append(AuditKind::NoEvent, percept.details().as_str())?;
            return Ok(None);
        };

        let body = wire::render_report(&event);
        self.audit.append(AuditKind::Event, &body)?;
        info!(
            sensor = %self.id,
            hazard = %event.hazard,
            severity = %event.severity,
            score = event.score,
            "hazard event reported"
        );

        let report = Envelope::inform(
            self.id.clone(),
            self.config.recipient.clone(),
            MessageTag::SensorReport,
            body,
        );
        if let Err(err) = self.bus.send(report).await {
            self.audit
                .append(AuditKind::Warn, &format!("report delivery failed: {err}"))?;
            return Err(err.into());
        }

        Ok(Some(event))
    }

    /// Run the loop until shutdown. Tick failures are logged and the loop
    /// keeps its own cadence; only the caller decides to stop.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.period);
        info!(sensor = %self.id, period = ?self.config.period, "sensor loop started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(err) = self.tick().await {
                        warn!(sensor = %self.id, error = %err, "sensor tick failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(sensor = %self.id, "sensor loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_audit::MemoryAuditSink;
    use beacon_types::{Percept, Severity};

    /// Replays a fixed list of percepts.
    struct Scripted {
        percepts: Vec<Percept>,
        next: usize,
    }

    impl Scripted {
        fn new(percepts: Vec<Percept>) -> Self {
            Self { percepts, next: 0 }
        }
    }

    impl PerceptSource for Scripted {
        fn sample(&mut self) -> Percept {
            let percept = self.percepts[self.next % self.percepts.len()];
            self.next += 1;
            percept
        }
    }

    fn agent(
        percepts: Vec<Percept>,
        mode: ReportMode,
        bus: &MessageBus,
        audit: &Arc<MemoryAuditSink>,
    ) -> SensorAgent {
        SensorAgent::new(
            AgentId::new("sensor-1"),
            SensorConfig {
                recipient: AgentId::new("responder"),
                period: Duration::from_secs(5),
                mode,
            },
            Box::new(Scripted::new(percepts)),
            bus.clone(),
            Arc::clone(audit) as Arc<dyn AuditSink>,
        )
    }

    #[tokio::test]
    async fn quiet_tick_logs_no_event_and_sends_nothing() {
        let bus = MessageBus::new();
        let mut mailbox = bus.register(AgentId::new("responder")).await;
        let audit = Arc::new(MemoryAuditSink::new());
        let mut sensor = agent(
            vec![Percept::new(15.0, 29.0, 3.0, 0.5)],
            ReportMode::AboveThreshold,
            &bus,
            &audit,
        );

        let event = sensor.tick().await.unwrap();
        assert!(event.is_none());
        assert_eq!(audit.count_of(AuditKind::NoEvent), 1);
        assert!(mailbox
            .recv_deadline(Duration::from_millis(10))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn flood_tick_reports_and_audits() {
        let bus = MessageBus::new();
        let mut mailbox = bus.register(AgentId::new("responder")).await;
        let audit = Arc::new(MemoryAuditSink::new());
        let mut sensor = agent(
            vec![Percept::new(90.0, 29.0, 3.0, 0.5)],
            ReportMode::AboveThreshold,
            &bus,
            &audit,
        );

        let event = sensor.tick().await.unwrap().unwrap();
        assert_eq!(event.severity, Severity::Moderate);

        let delivered = mailbox
            .recv_deadline(Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(delivered.tag, MessageTag::SensorReport);
        assert!(delivered.body.contains("|FLOOD|MODERATE|90.0|"));
        assert_eq!(audit.count_of(AuditKind::Event), 1);
    }

    #[tokio::test]
    async fn always_mode_reports_below_threshold() {
        let bus = MessageBus::new();
        let mut mailbox = bus.register(AgentId::new("responder")).await;
        let audit = Arc::new(MemoryAuditSink::new());
        let mut sensor = agent(
            vec![Percept::new(15.0, 29.0, 3.0, 0.5)],
            ReportMode::Always,
            &bus,
            &audit,
        );

        let event = sensor.tick().await.unwrap().unwrap();
        assert_eq!(event.severity, Severity::Low);
        let delivered = mailbox
            .recv_deadline(Duration::from_millis(50))
            .await
            .unwrap();
        assert!(delivered.body.contains("|FLOOD|LOW|15.0|"));
    }

    #[tokio::test]
    async fn failed_send_is_audited_and_surfaced() {
        // No responder mailbox registered.
        let bus = MessageBus::new();
        let audit = Arc::new(MemoryAuditSink::new());
        let mut sensor = agent(
            vec![Percept::new(90.0, 29.0, 3.0, 0.5)],
            ReportMode::AboveThreshold,
            &bus,
            &audit,
        );

        let err = sensor.tick().await.unwrap_err();
        assert!(matches!(err, SensorError::Transport(_)));
        assert_eq!(audit.count_of(AuditKind::Warn), 1);
        // The event line was still written before the send was attempted.
        assert_eq!(audit.count_of(AuditKind::Event), 1);
    }

    #[test]
    fn report_mode_parses() {
        assert_eq!(
            "above-threshold".parse::<ReportMode>().unwrap(),
            ReportMode::AboveThreshold
        );
        assert_eq!("always".parse::<ReportMode>().unwrap(), ReportMode::Always);
        assert!("sometimes".parse::<ReportMode>().is_err());
    }
}
