//! Shared helpers for commands that draw a task.

use std::fmt;

use serde::Serialize;

use schedviz_core::{BinModel, DrawAction, EntryId, LatencyBox, RenderContext, SCHED_SWITCH};

use crate::{Config, LoadedTrace};

/// Which of the two interval kinds a box shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    WakeLatency,
    Preemption,
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WakeLatency => "wake_latency",
            Self::Preemption => "preemption",
        };
        // Honors width flags.
        f.pad(s)
    }
}

/// One drawn interval, flattened for output.
#[derive(Debug, Clone, Serialize)]
pub struct IntervalReport {
    pub kind: IntervalKind,
    pub start: EntryId,
    pub end: EntryId,
    pub start_ts: u64,
    pub end_ts: u64,
    #[serde(flatten)]
    pub shape: LatencyBox,
}

impl IntervalReport {
    pub fn new(trace: &LoadedTrace, shape: &LatencyBox) -> Self {
        let start = shape.start().entry;
        let end = shape.end().entry;
        // Preemptions start at the switch that took the CPU away.
        let kind = if trace.event_name(start) == SCHED_SWITCH {
            IntervalKind::Preemption
        } else {
            IntervalKind::WakeLatency
        };
        Self {
            kind,
            start,
            end,
            start_ts: trace.store[start].ts,
            end_ts: trace.store[end].ts,
            shape: shape.clone(),
        }
    }
}

impl fmt::Display for IntervalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [left, _, right, _] = self.shape.points;
        write!(
            f,
            "{:<12} {} -> {}  ts {} -> {}  x {}..{}",
            self.kind, self.start, self.end, self.start_ts, self.end_ts, left.x, right.x
        )
    }
}

/// Draws the task graph of `pid` over `[min, max]`, defaulting to the whole
/// trace.
pub fn draw_task(
    trace: &mut LoadedTrace,
    config: &Config,
    pid: i32,
    min: Option<u64>,
    max: Option<u64>,
) -> Vec<LatencyBox> {
    let (first, last) = trace.time_range().unwrap_or_default();
    let model = BinModel::new(
        min.unwrap_or(first),
        max.unwrap_or(last),
        config.graph.bin_count,
    );
    let graph = config.graph.graph();
    tracing::debug!(?model, pid, "drawing task");

    trace.registry.set_palette(config.colors);
    trace.registry.draw(
        &mut trace.store,
        RenderContext {
            graph: &graph,
            model: &model,
        },
        trace.stream,
        pid,
        DrawAction::TASK_DRAW,
    )
}
