//! Pick command: hit tests the drawn intervals and double-clicks the first
//! one under the point.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use anyhow::Result;

use schedviz_core::{EntryId, MarkerService, MarkerSlot, find_at};

use super::util::{IntervalReport, draw_task};
use crate::{Config, LoadedTrace};

/// Marker facility of the CLI host: remembers where markers were placed.
#[derive(Debug, Default)]
pub struct MarkerLog {
    marks: RefCell<Vec<(MarkerSlot, EntryId)>>,
}

impl MarkerLog {
    pub fn marks(&self) -> Vec<(MarkerSlot, EntryId)> {
        self.marks.borrow().clone()
    }
}

impl MarkerService for MarkerLog {
    fn mark_entry(&self, entry: EntryId, slot: MarkerSlot) {
        tracing::debug!(%entry, %slot, "marker placed");
        self.marks.borrow_mut().push((slot, entry));
    }
}

/// Draws `pid`, clicks at `(x, y)` and writes the interval hit and the
/// markers it placed.
pub fn run<W: Write>(
    writer: &mut W,
    trace: &mut LoadedTrace,
    config: &Config,
    pid: i32,
    window: (Option<u64>, Option<u64>),
    (x, y): (i32, i32),
) -> Result<()> {
    let markers = Rc::new(MarkerLog::default());
    trace.registry.set_marker_service(markers.clone());

    let shapes = draw_task(trace, config, pid, window.0, window.1);
    let Some(shape) = find_at(&shapes, x, y) else {
        writeln!(writer, "No shape at ({x}, {y}).")?;
        return Ok(());
    };

    writeln!(writer, "{}", IntervalReport::new(trace, shape))?;
    shape.double_click();

    for (slot, entry) in markers.marks() {
        let e = &trace.store[entry];
        writeln!(
            writer,
            "Marker {slot}: {entry} ts={} {} pid={}",
            e.ts,
            trace.event_name(entry),
            e.pid
        )?;
    }

    Ok(())
}
