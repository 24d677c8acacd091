use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::dispatch::Command;

// ── Command metrics ─────────────────────────────────────────────

/// Counter: commands applied. Labels: command, status.
pub const COMMANDS_TOTAL: &str = "daygrid_commands_total";

/// Histogram: command latency in seconds. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "daygrid_command_duration_seconds";

// ── Store metrics ───────────────────────────────────────────────

/// Counter: slot placements computed for created or moved events.
pub const EVENTS_PLACED_TOTAL: &str = "daygrid_events_placed_total";

/// Gauge: resources currently in the store.
pub const RESOURCES_ACTIVE: &str = "daygrid_resources_active";

/// Counter: change log compactions.
pub const COMPACTIONS_TOTAL: &str = "daygrid_compactions_total";

/// Histogram: group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "daygrid_wal_flush_duration_seconds";

/// Histogram: changes per group-commit flush.
pub const WAL_FLUSH_BATCH_SIZE: &str = "daygrid_wal_flush_batch_size";

/// Install the Prometheus exporter on `port`. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Short label for a command, used on every command metric.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::CreateResource { .. } => "create_resource",
        Command::RenameResource { .. } => "rename_resource",
        Command::DeleteResource { .. } => "delete_resource",
        Command::CreateEvent { .. } => "create_event",
        Command::UpdateEvent { .. } => "update_event",
        Command::ProposeMove { .. } => "propose_move",
        Command::DeleteEvent { .. } => "delete_event",
    }
}
