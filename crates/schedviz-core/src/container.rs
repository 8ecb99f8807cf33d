//! Containers pairing trace entries with a value extracted at load time.

use serde::{Deserialize, Serialize};

use crate::entry::EventStore;
use crate::types::EntryId;

/// An entry together with one integer field decoded from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    pub entry: EntryId,
    pub field: i64,
}

/// Ordered collection of [`DataField`]s for one event type.
///
/// The container is filled while the stream loads and then sorted once by
/// the timestamps of the referenced entries. After that it is only read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldContainer {
    data: Vec<DataField>,
    sorted: bool,
}

impl FieldContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: EntryId, field: i64) {
        self.data.push(DataField { entry, field });
        self.sorted = false;
    }

    /// Sorts the fields by the timestamp of their entries.
    ///
    /// Fields with equal timestamps are ordered by entry index.
    pub fn sort_by_time(&mut self, store: &EventStore) {
        self.data.sort_by_key(|d| (store[d.entry].ts, d.entry));
        self.sorted = true;
    }

    pub const fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&DataField> {
        self.data.get(i)
    }

    pub fn as_slice(&self) -> &[DataField] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataField> {
        self.data.iter()
    }

    /// Index of the first field whose entry is not older than `ts`.
    ///
    /// Returns `len()` if every entry is older. The container must be sorted.
    pub fn find_first_at_or_after(&self, store: &EventStore, ts: u64) -> usize {
        self.data.partition_point(|d| store[d.entry].ts < ts)
    }
}

impl std::ops::Index<usize> for FieldContainer {
    type Output = DataField;

    fn index(&self, i: usize) -> &Self::Output {
        &self.data[i]
    }
}

impl<'a> IntoIterator for &'a FieldContainer {
    type Item = &'a DataField;
    type IntoIter = std::slice::Iter<'a, DataField>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
