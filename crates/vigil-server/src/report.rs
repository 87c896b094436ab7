//! Status Report Rendering
//!
//! Renders the liveness table for the operator after every cycle, either as
//! a column-aligned text table or as JSON for machine consumption.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::table::AgentRecord;

/// Output format for the per-cycle status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// One row of the rendered report.
#[derive(Debug, Serialize)]
struct AgentStatus {
    address: String,
    last_seen: String,
    alive: bool,
    sysinfo: String,
}

impl AgentStatus {
    fn from_record(record: &AgentRecord) -> Self {
        Self {
            address: record.addr.to_string(),
            last_seen: format_time(record.last_seen),
            alive: record.alive,
            sysinfo: record.sysinfo.clone(),
        }
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render a table snapshot in the requested format.
pub fn render(snapshot: &[AgentRecord], format: ReportFormat) -> String {
    let rows: Vec<AgentStatus> = snapshot.iter().map(AgentStatus::from_record).collect();
    match format {
        ReportFormat::Text => render_text(&rows),
        ReportFormat::Json => {
            // Rows hold only strings and bools; serialization cannot fail.
            serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

fn render_text(rows: &[AgentStatus]) -> String {
    let mut out = String::new();
    out.push_str("=== Agent Status ===\n");
    out.push_str(&format!(
        "{:<22}{:<21}{:<8}{}\n",
        "Address", "Last Seen", "Status", "System Info"
    ));
    out.push_str(&"-".repeat(75));
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{:<22}{:<21}{:<8}{}\n",
            row.address,
            row.last_seen,
            if row.alive { "Alive" } else { "Dead" },
            row.sysinfo
        ));
    }
    out
}
