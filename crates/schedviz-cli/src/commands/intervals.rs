//! Intervals command: lists the latency boxes drawn for a task.

use std::io::Write;

use anyhow::Result;

use super::util::{IntervalReport, draw_task};
use crate::{Config, LoadedTrace};

/// Draws `pid` and writes one line (or JSON object) per interval.
pub fn run<W: Write>(
    writer: &mut W,
    trace: &mut LoadedTrace,
    config: &Config,
    pid: i32,
    window: (Option<u64>, Option<u64>),
    json: bool,
) -> Result<()> {
    let shapes = draw_task(trace, config, pid, window.0, window.1);
    let reports: Vec<IntervalReport> = shapes
        .iter()
        .map(|shape| IntervalReport::new(trace, shape))
        .collect();

    if json {
        for report in &reports {
            writeln!(writer, "{}", serde_json::to_string(report)?)?;
        }
        return Ok(());
    }

    if reports.is_empty() {
        writeln!(writer, "No intervals for task {pid}.")?;
        return Ok(());
    }
    writeln!(writer, "Task {pid}: {} intervals", reports.len())?;
    for report in &reports {
        writeln!(writer, "{report}")?;
    }

    Ok(())
}
