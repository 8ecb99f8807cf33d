//! Matching of start and end events into intervals.
//!
//! For every visible field of container A accepted by predicate A, the first
//! field of container B accepted by predicate B at or after the same time
//! closes the interval. Starts without an end are dropped.

use crate::container::{DataField, FieldContainer};
use crate::entry::EventStore;
use crate::graph::Graph;
use crate::model::BinModel;
use crate::types::Color;

/// Everything the matcher reads besides the containers.
#[derive(Clone, Copy)]
pub struct PlotArgs<'a> {
    pub store: &'a EventStore,
    pub graph: &'a dyn Graph,
    pub model: &'a BinModel,
}

/// Iterator over the shapes of matched intervals, in ascending start time.
///
/// Created by [`find_intervals`].
pub struct IntervalIter<'a, A, B, F> {
    args: PlotArgs<'a>,
    data_a: &'a FieldContainer,
    check_a: A,
    data_b: &'a FieldContainer,
    check_b: B,
    make_shape: F,
    color: Color,
    size: f32,
    next_a: usize,
}

/// Pairs starts from `data_a` with ends from `data_b` and builds one shape per
/// pair.
///
/// Predicates receive the container, the event store and an index into the
/// container. `make_shape` receives the graph, the start and end bins, the
/// start and end fields, `color` and `size`.
#[expect(clippy::too_many_arguments, reason = "mirrors the host plotting callback")]
pub fn find_intervals<'a, A, B, F, S>(
    args: PlotArgs<'a>,
    data_a: &'a FieldContainer,
    check_a: A,
    data_b: &'a FieldContainer,
    check_b: B,
    make_shape: F,
    color: Color,
    size: f32,
) -> IntervalIter<'a, A, B, F>
where
    A: Fn(&FieldContainer, &EventStore, usize) -> bool,
    B: Fn(&FieldContainer, &EventStore, usize) -> bool,
    F: FnMut(&dyn Graph, [usize; 2], [DataField; 2], Color, f32) -> S,
{
    let next_a = if data_b.is_empty() {
        data_a.len()
    } else {
        data_a.find_first_at_or_after(args.store, args.model.min)
    };

    IntervalIter {
        args,
        data_a,
        check_a,
        data_b,
        check_b,
        make_shape,
        color,
        size,
        next_a,
    }
}

impl<A, B, F> IntervalIter<'_, A, B, F>
where
    B: Fn(&FieldContainer, &EventStore, usize) -> bool,
{
    /// Index in container B of the end matching the start at `index_a`.
    fn find_end(&self, index_a: usize, start: &DataField, ts: u64) -> Option<usize> {
        let store = self.args.store;
        let mut first = self.data_b.find_first_at_or_after(store, ts);
        if std::ptr::eq(self.data_a, self.data_b) {
            first = first.max(index_a + 1);
        }

        (first..self.data_b.len()).find(|&j| {
            self.data_b[j].entry != start.entry && (self.check_b)(self.data_b, store, j)
        })
    }
}

impl<A, B, F, S> Iterator for IntervalIter<'_, A, B, F>
where
    A: Fn(&FieldContainer, &EventStore, usize) -> bool,
    B: Fn(&FieldContainer, &EventStore, usize) -> bool,
    F: FnMut(&dyn Graph, [usize; 2], [DataField; 2], Color, f32) -> S,
{
    type Item = S;

    fn next(&mut self) -> Option<S> {
        let store = self.args.store;
        let model = self.args.model;

        while self.next_a < self.data_a.len() {
            let index_a = self.next_a;
            self.next_a += 1;

            let start = self.data_a[index_a];
            let ts_a = store[start.entry].ts;
            let Some(bin_a) = model.bin_of(ts_a) else {
                // Past the visible range; containers are time ordered.
                self.next_a = self.data_a.len();
                break;
            };
            if !(self.check_a)(self.data_a, store, index_a) {
                continue;
            }

            let Some(index_b) = self.find_end(index_a, &start, ts_a) else {
                tracing::trace!(entry = %start.entry, "interval start without end");
                continue;
            };
            let end = self.data_b[index_b];
            let bin_b = model.clamped_bin(store[end.entry].ts);

            tracing::trace!(start = %start.entry, end = %end.entry, bin_a, bin_b, "interval");
            return Some((self.make_shape)(
                self.args.graph,
                [bin_a, bin_b],
                [start, end],
                self.color,
                self.size,
            ));
        }
        None
    }
}

impl<A, B, F, S> std::iter::FusedIterator for IntervalIter<'_, A, B, F>
where
    A: Fn(&FieldContainer, &EventStore, usize) -> bool,
    B: Fn(&FieldContainer, &EventStore, usize) -> bool,
    F: FnMut(&dyn Graph, [usize; 2], [DataField; 2], Color, f32) -> S,
{
}
