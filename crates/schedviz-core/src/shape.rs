//! Latency boxes: the shapes drawn for matched intervals.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::container::DataField;
use crate::graph::Graph;
use crate::types::{Color, EntryId, Point};

/// Distance reported for clicks that miss a shape.
pub const UNREACHABLE: f64 = f64::MAX;

/// Size value asking the host to use its default stroke width.
pub const DEFAULT_SIZE: f32 = -1.0;

/// Share of the row height covered by a box.
const HEIGHT_RATIO: f64 = 0.3;

/// The host's two dual-marker slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarkerSlot {
    A,
    B,
}

impl fmt::Display for MarkerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Host capability for placing a marker on an entry.
///
/// Implementations are expected to use interior mutability; shapes only hold
/// a shared handle.
pub trait MarkerService {
    fn mark_entry(&self, entry: EntryId, slot: MarkerSlot);
}

/// A stroked rectangle spanning a wake-up latency or a preemption.
#[derive(Clone, Serialize)]
pub struct LatencyBox {
    /// Corners, clockwise from the top left.
    pub points: [Point; 4],
    pub fill: bool,
    pub size: f32,
    pub color: Color,
    /// The start and end fields of the interval.
    pub data: [DataField; 2],
    #[serde(skip)]
    marker: Option<Rc<dyn MarkerService>>,
}

impl fmt::Debug for LatencyBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatencyBox")
            .field("points", &self.points)
            .field("fill", &self.fill)
            .field("size", &self.size)
            .field("color", &self.color)
            .field("data", &self.data)
            .field("has_marker", &self.marker.is_some())
            .finish()
    }
}

impl LatencyBox {
    /// Distance between a click and the box: zero inside (edges included),
    /// [`UNREACHABLE`] anywhere else.
    pub fn distance(&self, x: i32, y: i32) -> f64 {
        let [top_left, bottom_left, bottom_right, _] = self.points;
        if x < top_left.x || x > bottom_right.x {
            return UNREACHABLE;
        }
        if y < top_left.y || y > bottom_left.y {
            return UNREACHABLE;
        }
        0.0
    }

    /// Marks the end entry with B and the start entry with A.
    pub fn double_click(&self) {
        let Some(marker) = &self.marker else {
            tracing::warn!("double click on a latency box without a marker service");
            return;
        };
        marker.mark_entry(self.data[1].entry, MarkerSlot::B);
        marker.mark_entry(self.data[0].entry, MarkerSlot::A);
    }

    pub const fn start(&self) -> &DataField {
        &self.data[0]
    }

    pub const fn end(&self) -> &DataField {
        &self.data[1]
    }
}

/// Builds [`LatencyBox`]es, handing each one the marker service.
#[derive(Clone, Default)]
pub struct ShapeBuilder {
    marker: Option<Rc<dyn MarkerService>>,
}

impl ShapeBuilder {
    pub fn new(marker: Option<Rc<dyn MarkerService>>) -> Self {
        Self { marker }
    }

    /// Creates the box between the columns `bins[0]` and `bins[1]`, anchored
    /// on the row's baseline.
    #[allow(clippy::cast_possible_truncation)]
    pub fn build(
        &self,
        graph: &dyn Graph,
        bins: [usize; 2],
        data: [DataField; 2],
        color: Color,
        size: f32,
    ) -> LatencyBox {
        let p0 = graph.bin(bins[0]).base;
        let p1 = graph.bin(bins[1]).base;
        let height = (f64::from(graph.height()) * HEIGHT_RATIO) as i32;

        LatencyBox {
            points: [
                Point::new(p0.x - 1, p0.y - height),
                Point::new(p0.x - 1, p0.y - 1),
                Point::new(p1.x - 1, p1.y - 1),
                Point::new(p1.x - 1, p1.y - height),
            ],
            fill: false,
            size,
            color,
            data,
            marker: self.marker.clone(),
        }
    }
}

/// Returns the first shape that contains the point.
pub fn find_at(shapes: &[LatencyBox], x: i32, y: i32) -> Option<&LatencyBox> {
    shapes.iter().find(|shape| shape.distance(x, y) < UNREACHABLE)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::graph::UniformGraph;

    #[derive(Default)]
    struct RecordingMarker {
        marks: RefCell<Vec<(EntryId, MarkerSlot)>>,
    }

    impl MarkerService for RecordingMarker {
        fn mark_entry(&self, entry: EntryId, slot: MarkerSlot) {
            self.marks.borrow_mut().push((entry, slot));
        }
    }

    fn graph() -> UniformGraph {
        UniformGraph::new(Point::new(0, 40), 10, 40, 20)
    }

    fn data() -> [DataField; 2] {
        [
            DataField {
                entry: EntryId(3),
                field: 7,
            },
            DataField {
                entry: EntryId(8),
                field: 0,
            },
        ]
    }

    #[test]
    fn box_spans_columns_above_baseline() {
        let shape = ShapeBuilder::default().build(&graph(), [2, 9], data(), Color::GREEN, 1.0);

        assert_eq!(
            shape.points,
            [
                Point::new(19, 28),
                Point::new(19, 39),
                Point::new(89, 39),
                Point::new(89, 28),
            ]
        );
        assert!(!shape.fill);
        assert_eq!(shape.color, Color::GREEN);
        assert_eq!(shape.start().entry, EntryId(3));
        assert_eq!(shape.end().entry, EntryId(8));
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "distance is exactly zero or UNREACHABLE"
    )]
    fn distance_is_zero_on_closed_bounds() {
        let shape = ShapeBuilder::default().build(&graph(), [2, 9], data(), Color::RED, 1.0);

        for (x, y) in [(19, 28), (89, 39), (19, 39), (89, 28), (50, 30)] {
            assert!(shape.distance(x, y) == 0.0, "({x}, {y}) should hit");
        }
        for (x, y) in [(18, 30), (90, 30), (50, 27), (50, 40)] {
            assert!(shape.distance(x, y) == UNREACHABLE, "({x}, {y}) should miss");
        }
    }

    #[test]
    fn double_click_marks_end_then_start() {
        let marker = Rc::new(RecordingMarker::default());
        let builder = ShapeBuilder::new(Some(marker.clone() as Rc<dyn MarkerService>));
        let shape = builder.build(&graph(), [2, 9], data(), Color::GREEN, 1.0);

        shape.double_click();

        assert_eq!(
            *marker.marks.borrow(),
            vec![(EntryId(8), MarkerSlot::B), (EntryId(3), MarkerSlot::A)]
        );
    }

    #[test]
    fn double_click_without_marker_is_ignored() {
        let shape = ShapeBuilder::default().build(&graph(), [0, 1], data(), Color::GREEN, 1.0);
        shape.double_click();
    }

    #[test]
    fn find_at_returns_first_hit() {
        let builder = ShapeBuilder::default();
        let shapes = vec![
            builder.build(&graph(), [0, 3], data(), Color::GREEN, 1.0),
            builder.build(&graph(), [2, 9], data(), Color::RED, 1.0),
        ];

        assert_eq!(find_at(&shapes, 25, 30).map(|s| s.color), Some(Color::GREEN));
        assert_eq!(find_at(&shapes, 60, 30).map(|s| s.color), Some(Color::RED));
        assert!(find_at(&shapes, 60, 0).is_none());
    }

    #[test]
    fn serializes_without_marker() {
        let shape = ShapeBuilder::default().build(&graph(), [1, 2], data(), Color::RED, -1.0);
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json["color"], serde_json::json!([255, 0, 0]));
        assert_eq!(json["data"][0]["entry"], 3);
        assert!(json.get("marker").is_none());
    }
}
