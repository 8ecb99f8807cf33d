//! Geometry of the task graph the shapes are drawn on.

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// One column of a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bin {
    /// Point on the graph's baseline at the column's x position.
    pub base: Point,
}

/// Column geometry supplied by the host for one graph row.
pub trait Graph {
    /// Returns the column at `bin`. Out-of-range bins are clamped to the
    /// nearest column.
    fn bin(&self, bin: usize) -> Bin;

    /// Height of the row in pixels.
    fn height(&self) -> i32;

    /// Number of columns.
    fn size(&self) -> usize;
}

/// A graph whose columns are evenly spaced along a horizontal baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformGraph {
    /// Baseline position of column 0.
    pub origin: Point,
    pub bin_width: i32,
    pub row_height: i32,
    pub bin_count: usize,
}

impl UniformGraph {
    pub const fn new(origin: Point, bin_width: i32, row_height: i32, bin_count: usize) -> Self {
        Self {
            origin,
            bin_width,
            row_height,
            bin_count,
        }
    }
}

impl Graph for UniformGraph {
    fn bin(&self, bin: usize) -> Bin {
        let bin = bin.min(self.bin_count.saturating_sub(1));
        let offset = i32::try_from(bin)
            .unwrap_or(i32::MAX)
            .saturating_mul(self.bin_width);
        Bin {
            base: Point::new(self.origin.x.saturating_add(offset), self.origin.y),
        }
    }

    fn height(&self) -> i32 {
        self.row_height
    }

    fn size(&self) -> usize {
        self.bin_count
    }
}
