//! End-to-end coordination loop: sensor ticks feed the responder over the
//! bus, and the audit trail comes out in strict transition order.

use std::sync::Arc;
use std::time::Duration;

use beacon_audit::{AuditKind, AuditSink, MemoryAuditSink};
use beacon_responder::{Phase, ResponderAgent, ResponderConfig};
use beacon_sensor::{PerceptSource, ReportMode, SensorAgent, SensorConfig};
use beacon_transport::MessageBus;
use beacon_types::{AgentId, Percept};

struct Fixed(Percept);

impl PerceptSource for Fixed {
    fn sample(&mut self) -> Percept {
        self.0
    }
}

fn sensor(
    name: &str,
    percept: Percept,
    bus: &MessageBus,
    audit: &Arc<MemoryAuditSink>,
) -> SensorAgent {
    SensorAgent::new(
        AgentId::new(name),
        SensorConfig {
            recipient: AgentId::new("responder"),
            period: Duration::from_secs(5),
            mode: ReportMode::AboveThreshold,
        },
        Box::new(Fixed(percept)),
        bus.clone(),
        Arc::clone(audit) as Arc<dyn AuditSink>,
    )
}

async fn responder(bus: &MessageBus, audit: &Arc<MemoryAuditSink>) -> ResponderAgent {
    let id = AgentId::new("responder");
    let mailbox = bus.register(id.clone()).await;
    ResponderAgent::new(
        id,
        ResponderConfig {
            receive_timeout: Duration::from_millis(50),
            response_delay: Duration::ZERO,
            field_unit: None,
        },
        mailbox,
        bus.clone(),
        Arc::clone(audit) as Arc<dyn AuditSink>,
    )
}

/// Drive the machine from Monitoring through one full cycle.
async fn drive_cycle(agent: &mut ResponderAgent) {
    let mut phase = Phase::Monitoring;
    loop {
        phase = agent.step(phase).await.expect("phase must not fail");
        if phase == Phase::Monitoring {
            break;
        }
    }
}

#[tokio::test]
async fn sensor_report_drives_a_full_response_cycle() {
    let bus = MessageBus::new();
    let audit = Arc::new(MemoryAuditSink::new());
    let mut responder = responder(&bus, &audit).await;

    // water 120 -> flood score 120 -> HIGH, an emergency.
    let mut flood_sensor = sensor("sensor-1", Percept::new(120.0, 30.0, 5.0, 1.0), &bus, &audit);
    let event = flood_sensor.tick().await.unwrap().unwrap();
    assert!(event.severity.is_emergency());

    drive_cycle(&mut responder).await;

    // One line per decision point, in transition order.
    let kinds: Vec<String> = audit
        .lines()
        .iter()
        .map(|line| {
            line.split("] ")
                .nth(1)
                .and_then(|rest| rest.split(' ').next())
                .unwrap_or_default()
                .to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["EVENT", "REPORT", "CLASSIFIED", "ACTION", "DONE"]
    );

    // The DONE line quotes the original detail string end-to-end.
    let done = audit.lines_of(AuditKind::Done);
    assert!(done[0].contains("water=120.0,temp=30.0,smoke=5.0,tremor=1.00"));
}

#[tokio::test]
async fn quiet_sensor_never_wakes_the_responder() {
    let bus = MessageBus::new();
    let audit = Arc::new(MemoryAuditSink::new());
    let mut responder = responder(&bus, &audit).await;

    let mut quiet_sensor = sensor("sensor-1", Percept::new(15.0, 29.0, 3.0, 0.5), &bus, &audit);
    assert!(quiet_sensor.tick().await.unwrap().is_none());

    // Nothing was sent, so monitoring times out and self-loops.
    let phase = responder.step(Phase::Monitoring).await.unwrap();
    assert_eq!(phase, Phase::Monitoring);

    assert_eq!(audit.count_of(AuditKind::NoEvent), 1);
    assert_eq!(audit.count_of(AuditKind::Action), 0);
}

#[tokio::test]
async fn many_sensors_one_responder_processes_reports_in_turn() {
    let bus = MessageBus::new();
    let audit = Arc::new(MemoryAuditSink::new());
    let mut responder = responder(&bus, &audit).await;

    let mut flood = sensor("sensor-1", Percept::new(120.0, 30.0, 5.0, 1.0), &bus, &audit);
    let mut quake = sensor("sensor-2", Percept::new(0.0, 29.0, 3.0, 8.0), &bus, &audit);
    flood.tick().await.unwrap();
    quake.tick().await.unwrap();

    // Each report is processed fully before the next is accepted.
    drive_cycle(&mut responder).await;
    drive_cycle(&mut responder).await;

    let actions = audit.lines_of(AuditKind::Action);
    assert_eq!(actions.len(), 2);
    assert!(actions[0].contains("Deploy sandbags"));
    assert!(actions[1].contains("Send rescue team"));
    assert_eq!(audit.count_of(AuditKind::Done), 2);
}
