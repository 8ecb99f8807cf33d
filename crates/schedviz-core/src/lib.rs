//! Core engine of the scheduler-events view.
//!
//! This crate contains:
//! - The entry arena and the per-event field containers
//! - The correction pass that retags events trailing a `sched_switch`
//! - Matching of wakeup/switch pairs into wake-up latency and preemption
//!   intervals
//! - Latency boxes with hit testing and marker placement
//! - Per-stream plugin contexts and the draw entry point

mod container;
mod correction;
mod entry;
mod graph;
mod interval;
mod model;
mod plugin;
pub mod sched_field;
mod shape;
mod types;

pub use container::{DataField, FieldContainer};
pub use correction::{CorrectionStats, correct};
pub use entry::{EventStore, StoreError, TraceEntry, visibility};
pub use graph::{Bin, Graph, UniformGraph};
pub use interval::{IntervalIter, PlotArgs, find_intervals};
pub use model::BinModel;
pub use plugin::{
    ContextRegistry, DrawAction, Palette, PluginContext, RenderContext, SCHED_SWITCH, WakeupEvent,
};
pub use shape::{
    DEFAULT_SIZE, LatencyBox, MarkerService, MarkerSlot, ShapeBuilder, UNREACHABLE, find_at,
};
pub use types::{Color, EntryId, Point, StreamId, ValidationError};
