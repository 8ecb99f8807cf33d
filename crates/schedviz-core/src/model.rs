//! Visible time range split into equally wide bins.

use serde::{Deserialize, Serialize};

/// The histogram model behind the graph: `n_bins` columns covering
/// `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinModel {
    pub min: u64,
    pub max: u64,
    pub n_bins: usize,
}

impl BinModel {
    /// Creates a model. `max` is raised to `min` and at least one bin is kept.
    pub fn new(min: u64, max: u64, n_bins: usize) -> Self {
        Self {
            min,
            max: max.max(min),
            n_bins: n_bins.max(1),
        }
    }

    /// Width of one bin in timestamp units, never zero.
    pub fn bin_size(&self) -> u64 {
        let span = (self.max - self.min).saturating_add(1);
        span.div_ceil(self.n_bins as u64).max(1)
    }

    pub const fn contains(&self, ts: u64) -> bool {
        ts >= self.min && ts <= self.max
    }

    /// Bin of a visible timestamp, `None` outside `[min, max]`.
    pub fn bin_of(&self, ts: u64) -> Option<usize> {
        self.contains(ts).then(|| self.clamped_bin(ts))
    }

    /// Bin of any timestamp; older ones land in the first bin, newer ones in
    /// the last.
    pub fn clamped_bin(&self, ts: u64) -> usize {
        let last = self.n_bins - 1;
        if ts <= self.min {
            return 0;
        }
        let bin = (ts - self.min) / self.bin_size();
        usize::try_from(bin).map_or(last, |b| b.min(last))
    }

    /// First timestamp covered by `bin`.
    pub fn bin_start(&self, bin: usize) -> u64 {
        self.min + bin as u64 * self.bin_size()
    }
}
