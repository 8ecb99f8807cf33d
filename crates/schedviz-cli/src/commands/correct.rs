//! Correct command: runs the `sched_switch` correction and lists its edits.

use std::io::Write;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use schedviz_core::EntryId;

use crate::LoadedTrace;

/// An entry the correction pass handed to another task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectedEntry {
    pub entry: EntryId,
    pub ts: u64,
    pub event: String,
    pub recorded_pid: i32,
    pub pid: i32,
}

/// Runs the correction pass over the trace and writes the rewritten entries.
pub fn run<W: Write>(writer: &mut W, trace: &mut LoadedTrace, json: bool) -> Result<()> {
    let Some(ctx) = trace.registry.context_mut(trace.stream) else {
        writeln!(writer, "No sched_switch events in trace.")?;
        return Ok(());
    };
    ctx.ensure_corrected(&mut trace.store);

    let corrected = corrected_entries(trace);
    if json {
        for entry in &corrected {
            writeln!(writer, "{}", serde_json::to_string(entry)?)?;
        }
        return Ok(());
    }

    if corrected.is_empty() {
        writeln!(writer, "No entries corrected.")?;
        return Ok(());
    }
    for c in &corrected {
        writeln!(
            writer,
            "{} ts={} {}: pid {} -> {}",
            c.entry, c.ts, c.event, c.recorded_pid, c.pid
        )?;
    }
    let noun = if corrected.len() == 1 { "entry" } else { "entries" };
    writeln!(writer, "{} {noun} corrected.", corrected.len())?;

    Ok(())
}

fn corrected_entries(trace: &LoadedTrace) -> Vec<CorrectedEntry> {
    trace
        .store
        .iter()
        .filter(|(_, e)| !e.is_untouched())
        .map(|(id, e)| CorrectedEntry {
            entry: id,
            ts: e.ts,
            event: trace.event_name(id).to_string(),
            recorded_pid: trace.recorded_pids[id.index()],
            pid: e.pid,
        })
        .collect()
}
