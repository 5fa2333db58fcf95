//! `beacon`: run the disaster-response coordination loop.
//!
//! Wires one responder (and optionally a field unit) to N simulated sensors
//! over the in-memory bus, runs for a fixed duration, then shuts everything
//! down gracefully.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beacon_audit::{AuditSink, FileAuditSink};
use beacon_responder::{FieldUnitAgent, ResponderAgent, ResponderConfig};
use beacon_sensor::{DriftEnvironment, ReportMode, SensorAgent, SensorConfig};
use beacon_transport::MessageBus;
use beacon_types::AgentId;

#[derive(Parser)]
#[command(name = "beacon", about = "Disaster-response sensing and coordination loop")]
#[command(version)]
struct Cli {
    /// Append-only audit log file
    #[arg(long, default_value = "beacon_audit.log")]
    log_file: PathBuf,

    /// Sensor sampling/report period in seconds
    #[arg(long, default_value_t = 5)]
    period: u64,

    /// Responder receive timeout in seconds
    #[arg(long, default_value_t = 10)]
    receive_timeout: u64,

    /// Simulated response latency in seconds
    #[arg(long, default_value_t = 3)]
    response_delay: u64,

    /// Total run duration in seconds
    #[arg(long, default_value_t = 60)]
    run_for: u64,

    /// 'above-threshold' reports only classified events; 'always' reports
    /// the dominant classification every tick
    #[arg(long, default_value = "above-threshold")]
    report_mode: ReportMode,

    /// Number of sensor instances feeding the responder
    #[arg(long, default_value_t = 1)]
    sensors: usize,

    /// Seed for the simulated environments (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Also run a field unit and route response tasks to it
    #[arg(long)]
    field_unit: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // The sink is the one fatal startup dependency: no agent enters its
    // loop without it.
    let audit: Arc<dyn AuditSink> = Arc::new(
        FileAuditSink::open(&cli.log_file)
            .with_context(|| format!("cannot open audit log {}", cli.log_file.display()))?,
    );

    let bus = MessageBus::new();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut tasks = Vec::new();

    let responder_id = AgentId::new("responder");
    let field_unit_id = AgentId::new("field-unit");

    if cli.field_unit {
        let mailbox = bus.register(field_unit_id.clone()).await;
        let agent = FieldUnitAgent::new(
            field_unit_id.clone(),
            Duration::from_secs(cli.receive_timeout),
            mailbox,
            bus.clone(),
            Arc::clone(&audit),
        );
        tasks.push(tokio::spawn(agent.run(shutdown_rx.clone())));
    }

    let responder_mailbox = bus.register(responder_id.clone()).await;
    let responder = ResponderAgent::new(
        responder_id.clone(),
        ResponderConfig {
            receive_timeout: Duration::from_secs(cli.receive_timeout),
            response_delay: Duration::from_secs(cli.response_delay),
            field_unit: cli.field_unit.then(|| field_unit_id.clone()),
        },
        responder_mailbox,
        bus.clone(),
        Arc::clone(&audit),
    );
    tasks.push(tokio::spawn(responder.run(shutdown_rx.clone())));

    for n in 1..=cli.sensors {
        let environment = match cli.seed {
            Some(seed) => DriftEnvironment::seeded(seed.wrapping_add(n as u64)),
            None => DriftEnvironment::new(),
        };
        let sensor = SensorAgent::new(
            AgentId::new(format!("sensor-{n}")),
            SensorConfig {
                recipient: responder_id.clone(),
                period: Duration::from_secs(cli.period),
                mode: cli.report_mode,
            },
            Box::new(environment),
            bus.clone(),
            Arc::clone(&audit),
        );
        tasks.push(tokio::spawn(sensor.run(shutdown_rx.clone())));
    }

    tracing::info!(
        sensors = cli.sensors,
        field_unit = cli.field_unit,
        run_for = cli.run_for,
        "beacon running"
    );
    tokio::time::sleep(Duration::from_secs(cli.run_for)).await;

    let _ = shutdown_tx.send(true);
    for task in tasks {
        task.await.context("agent task panicked")?;
    }

    tracing::info!("beacon stopped");
    Ok(())
}
