//! Loading of decoded trace dumps.
//!
//! The input is JSON Lines, one event per line:
//!
//! ```json
//! {"ts": 100, "cpu": 0, "pid": 7, "event": "sched_switch", "fields": {"prev_pid": 7, "prev_state": 0, "next_pid": 9}}
//! ```
//!
//! Loading plays the host's part: it owns the [`EventStore`], links the
//! entries in time order and feeds the scheduler events to the plugin
//! context.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use schedviz_core::{
    ContextRegistry, EntryId, EventStore, SCHED_SWITCH, StreamId, TraceEntry, WakeupEvent,
};

/// One decoded event as found in the dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub ts: u64,
    #[serde(default)]
    pub cpu: i16,
    pub pid: i32,
    pub event: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

impl RawEvent {
    fn int_field(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }
}

/// A loaded trace: the entries, their event names and the plugin state.
#[derive(Debug)]
pub struct LoadedTrace {
    pub store: EventStore,
    /// Event names indexed by event id.
    pub event_names: Vec<String>,
    pub registry: ContextRegistry,
    pub stream: StreamId,
    /// Pids as recorded, before any plugin rewrote them.
    pub recorded_pids: Vec<i32>,
}

impl LoadedTrace {
    /// Name of the event of `entry`.
    pub fn event_name(&self, entry: EntryId) -> &str {
        usize::try_from(self.store[entry].event_id)
            .ok()
            .and_then(|id| self.event_names.get(id))
            .map_or("<unknown>", String::as_str)
    }

    /// Timestamps of the first and last entries.
    pub fn time_range(&self) -> Option<(u64, u64)> {
        let entries = self.store.entries();
        Some((entries.first()?.ts, entries.last()?.ts))
    }
}

/// Reads and loads a trace file.
pub fn load(path: &Path) -> Result<LoadedTrace> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let events = parse(BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))?;
    build(events)
}

/// Parses JSON Lines, skipping blank lines.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: RawEvent = serde_json::from_str(&line)
            .with_context(|| format!("invalid event on line {}", index + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Builds the event store and the plugin context from decoded events.
pub fn build(mut events: Vec<RawEvent>) -> Result<LoadedTrace> {
    events.sort_by_key(|e| e.ts);

    let mut event_names: Vec<String> = Vec::new();
    let mut entries = Vec::with_capacity(events.len());
    for event in &events {
        let id = match event_names.iter().position(|n| *n == event.event) {
            Some(id) => id,
            None => {
                event_names.push(event.event.clone());
                event_names.len() - 1
            }
        };
        let id = i16::try_from(id).context("too many distinct event names")?;
        entries.push(TraceEntry::new(event.ts, event.pid, id, event.cpu));
    }
    let recorded_pids = entries.iter().map(|e| e.pid).collect();
    let mut store = EventStore::link_in_order(entries).context("failed to link entries")?;

    let stream = StreamId::new(0)?;
    let mut registry = ContextRegistry::new();

    if event_names.iter().any(|n| n == SCHED_SWITCH) {
        let wakeup = WakeupEvent::select(event_names.iter().map(String::as_str));
        tracing::debug!(?wakeup, "sched events found");

        let ctx = registry.init_context(stream);
        for (index, event) in events.iter().enumerate() {
            let entry = EntryId(index);
            if event.event == SCHED_SWITCH {
                let Some(next_pid) = event.int_field("next_pid") else {
                    tracing::warn!(ts = event.ts, "sched_switch without next_pid");
                    continue;
                };
                let prev_pid = event
                    .int_field("prev_pid")
                    .map_or(event.pid, |pid| pid_from(pid, event.pid));
                let prev_state = event.int_field("prev_state").unwrap_or(0);
                ctx.on_sched_switch(
                    &mut store,
                    entry,
                    prev_pid,
                    prev_state,
                    pid_from(next_pid, -1),
                );
            } else if wakeup.is_some_and(|w| w.name() == event.event) {
                let Some(pid) = event.int_field("pid") else {
                    tracing::warn!(ts = event.ts, event = %event.event, "wakeup without pid");
                    continue;
                };
                ctx.on_sched_wakeup(&store, entry, pid_from(pid, -1));
            }
        }
        ctx.finish_loading(&store);
    } else {
        tracing::debug!("no sched_switch events, plugin not loaded");
    }

    Ok(LoadedTrace {
        store,
        event_names,
        registry,
        stream,
        recorded_pids,
    })
}

fn pid_from(value: i64, fallback: i32) -> i32 {
    i32::try_from(value).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"{"ts": 30, "pid": 9, "event": "print"}
{"ts": 10, "pid": 7, "event": "sched_switch", "fields": {"prev_pid": 7, "prev_state": 0, "next_pid": 9}}

{"ts": 20, "pid": 7, "event": "print"}
{"ts": 25, "cpu": 1, "pid": 3, "event": "sched_waking", "fields": {"pid": 7}}
"#;

    #[test]
    fn parse_skips_blank_lines() {
        let events = parse(TRACE.as_bytes()).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[3].cpu, 1);
    }

    #[test]
    fn parse_reports_line_number() {
        let err = parse("{\"ts\": 1, \"pid\": 1, \"event\": \"a\"}\nnot json\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid event on line 2");
    }

    #[test]
    fn build_sorts_links_and_loads_sched_events() {
        let trace = build(parse(TRACE.as_bytes()).unwrap()).unwrap();

        let ts: Vec<u64> = trace.store.iter().map(|(_, e)| e.ts).collect();
        assert_eq!(ts, vec![10, 20, 25, 30]);
        assert_eq!(trace.event_names, vec!["sched_switch", "print", "sched_waking"]);
        assert_eq!(trace.event_name(EntryId(2)), "sched_waking");

        // The switch now belongs to the task switched in.
        assert_eq!(trace.store[EntryId(0)].pid, 9);
        assert_eq!(trace.recorded_pids[0], 7);

        let ctx = trace.registry.context(trace.stream).unwrap();
        assert_eq!(ctx.switch_data().len(), 1);
        assert_eq!(ctx.wakeup_data().len(), 1);
        assert_eq!(trace.time_range(), Some((10, 30)));
    }

    #[test]
    fn trace_without_switches_has_no_context() {
        let events = parse(r#"{"ts": 1, "pid": 1, "event": "print"}"#.as_bytes()).unwrap();
        let trace = build(events).unwrap();
        assert!(trace.registry.context(trace.stream).is_none());
    }

    #[test]
    fn sched_wakeup_is_used_without_waking() {
        let events = parse(
            r#"{"ts": 1, "pid": 1, "event": "sched_wakeup", "fields": {"pid": 4}}
{"ts": 2, "pid": 1, "event": "sched_switch", "fields": {"prev_pid": 1, "next_pid": 4}}"#
                .as_bytes(),
        )
        .unwrap();
        let trace = build(events).unwrap();
        let ctx = trace.registry.context(trace.stream).unwrap();
        assert_eq!(ctx.wakeup_data()[0].field, 4);
    }
}
