//! Per-stream plugin state and the draw entry point.
//!
//! The host creates one [`PluginContext`] per data stream that carries
//! `sched_switch` events, feeds it the switch and wakeup entries while
//! loading, and calls [`ContextRegistry::draw`] for every task graph it
//! redraws. The first draw of a stream runs the correction pass.

use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::container::FieldContainer;
use crate::correction;
use crate::entry::EventStore;
use crate::graph::Graph;
use crate::interval::{PlotArgs, find_intervals};
use crate::model::BinModel;
use crate::sched_field;
use crate::shape::{DEFAULT_SIZE, LatencyBox, MarkerService, ShapeBuilder};
use crate::types::{Color, EntryId, StreamId};

/// Name of the event every context is built around.
pub const SCHED_SWITCH: &str = "sched_switch";

/// Flags telling the plugin what kind of graph is being drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DrawAction(u32);

impl DrawAction {
    pub const TASK_DRAW: Self = Self(1 << 0);
    pub const CPU_DRAW: Self = Self(1 << 1);
    pub const COMBO_DRAW: Self = Self(1 << 2);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DrawAction {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DrawAction {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// The wakeup event a stream provides.
///
/// `sched_waking` fires in the waker's context before the target is
/// enqueued, so it is preferred over `sched_wakeup` when both exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeupEvent {
    SchedWaking,
    SchedWakeup,
}

impl WakeupEvent {
    pub const fn name(self) -> &'static str {
        match self {
            Self::SchedWaking => "sched_waking",
            Self::SchedWakeup => "sched_wakeup",
        }
    }

    /// Picks the wakeup event among the event names of a stream.
    pub fn select<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut found = None;
        for name in names {
            match name {
                "sched_waking" => return Some(Self::SchedWaking),
                "sched_wakeup" => found = Some(Self::SchedWakeup),
                _ => {}
            }
        }
        found
    }
}

impl fmt::Display for WakeupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Colors of the two interval kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub wake_latency: Color,
    pub preemption: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            wake_latency: Color::GREEN,
            preemption: Color::RED,
        }
    }
}

/// Plugin state of one data stream.
#[derive(Debug, Clone)]
pub struct PluginContext {
    stream: StreamId,
    /// `sched_switch` entries; the field encodes the task switched out.
    ss_data: FieldContainer,
    /// Wakeup entries; the field is the woken pid.
    sw_data: FieldContainer,
    second_pass_done: bool,
}

impl PluginContext {
    pub fn new(stream: StreamId) -> Self {
        Self {
            stream,
            ss_data: FieldContainer::new(),
            sw_data: FieldContainer::new(),
            second_pass_done: false,
        }
    }

    pub const fn stream(&self) -> StreamId {
        self.stream
    }

    /// Records a `sched_switch` entry and hands it to the task switched in.
    ///
    /// Switches with a negative `next_pid` are ignored.
    pub fn on_sched_switch(
        &mut self,
        store: &mut EventStore,
        entry: EntryId,
        prev_pid: i32,
        prev_state: i64,
        next_pid: i32,
    ) {
        if next_pid < 0 {
            return;
        }
        let Some(e) = store.get_mut(entry) else {
            tracing::warn!(%entry, "sched_switch entry not in store");
            return;
        };
        self.ss_data
            .append(entry, sched_field::encode(prev_pid.into(), prev_state));
        e.pid = next_pid;
    }

    /// Records a wakeup entry for `woken_pid`.
    pub fn on_sched_wakeup(&mut self, store: &EventStore, entry: EntryId, woken_pid: i32) {
        if store.get(entry).is_none() {
            tracing::warn!(%entry, "wakeup entry not in store");
            return;
        }
        self.sw_data.append(entry, woken_pid.into());
    }

    /// Sorts the containers once all entries are in.
    pub fn finish_loading(&mut self, store: &EventStore) {
        self.ss_data.sort_by_time(store);
        self.sw_data.sort_by_time(store);
        tracing::debug!(
            stream = %self.stream,
            switches = self.ss_data.len(),
            wakeups = self.sw_data.len(),
            "sched data loaded"
        );
    }

    pub const fn switch_data(&self) -> &FieldContainer {
        &self.ss_data
    }

    pub const fn wakeup_data(&self) -> &FieldContainer {
        &self.sw_data
    }

    pub const fn second_pass_done(&self) -> bool {
        self.second_pass_done
    }

    /// Runs the correction pass unless it already ran for this stream.
    pub fn ensure_corrected(&mut self, store: &mut EventStore) {
        if self.second_pass_done {
            return;
        }
        correction::correct(store, &self.ss_data);
        self.second_pass_done = true;
    }
}

/// Graph and time range of the redraw in progress.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub graph: &'a dyn Graph,
    pub model: &'a BinModel,
}

/// All plugin contexts of the host, keyed by stream.
#[derive(Default)]
pub struct ContextRegistry {
    contexts: HashMap<StreamId, PluginContext>,
    marker: Option<Rc<dyn MarkerService>>,
    palette: Palette,
}

impl fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("contexts", &self.contexts)
            .field("has_marker", &self.marker.is_some())
            .field("palette", &self.palette)
            .finish()
    }
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands the plugin the host's marker facility. Called once at load time.
    pub fn set_marker_service(&mut self, marker: Rc<dyn MarkerService>) {
        self.marker = Some(marker);
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Creates a fresh context for `stream`, replacing any previous one.
    pub fn init_context(&mut self, stream: StreamId) -> &mut PluginContext {
        tracing::debug!(%stream, "sched plugin context created");
        let ctx = self
            .contexts
            .entry(stream)
            .or_insert_with(|| PluginContext::new(stream));
        *ctx = PluginContext::new(stream);
        ctx
    }

    /// Drops the context of `stream`.
    pub fn close_context(&mut self, stream: StreamId) -> Option<PluginContext> {
        tracing::debug!(%stream, "sched plugin context closed");
        self.contexts.remove(&stream)
    }

    pub fn context(&self, stream: StreamId) -> Option<&PluginContext> {
        self.contexts.get(&stream)
    }

    pub fn context_mut(&mut self, stream: StreamId) -> Option<&mut PluginContext> {
        self.contexts.get_mut(&stream)
    }

    /// Returns the wake-up latency boxes of `pid` followed by its preemption
    /// boxes.
    ///
    /// Nothing is drawn for CPU graphs, for the idle task, or for streams
    /// without a context. The first call for a stream corrects its
    /// `sched_switch` entries.
    pub fn draw(
        &mut self,
        store: &mut EventStore,
        render: RenderContext<'_>,
        stream: StreamId,
        pid: i32,
        action: DrawAction,
    ) -> Vec<LatencyBox> {
        if !action.contains(DrawAction::TASK_DRAW) || pid == 0 {
            return Vec::new();
        }
        let Some(ctx) = self.contexts.get_mut(&stream) else {
            return Vec::new();
        };

        ctx.ensure_corrected(store);

        let store: &EventStore = store;
        let args = PlotArgs {
            store,
            graph: render.graph,
            model: render.model,
        };
        let builder = ShapeBuilder::new(self.marker.clone());
        let make_shape = |graph: &dyn Graph, bins, data, color, size| {
            builder.build(graph, bins, data, color, size)
        };
        let target = i64::from(pid);

        let wake_latency = find_intervals(
            args,
            &ctx.sw_data,
            |d, _, i| d[i].field == target,
            &ctx.ss_data,
            |d, s, i| s[d[i].entry].pid == pid,
            make_shape,
            self.palette.wake_latency,
            DEFAULT_SIZE,
        );
        let preemption = find_intervals(
            args,
            &ctx.ss_data,
            |d, _, i| {
                sched_field::was_preempted(d[i].field) && sched_field::pid(d[i].field) == pid
            },
            &ctx.ss_data,
            |d, s, i| s[d[i].entry].pid == pid,
            make_shape,
            self.palette.preemption,
            DEFAULT_SIZE,
        );

        let shapes: Vec<LatencyBox> = wake_latency.chain(preemption).collect();
        tracing::debug!(%stream, pid, shapes = shapes.len(), "sched intervals drawn");
        shapes
    }
}
