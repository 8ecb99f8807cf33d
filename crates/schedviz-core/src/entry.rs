//! Trace entries and the arena that owns them.
//!
//! Entries form a singly forward-linked chain through [`TraceEntry::next`].
//! Links are indices into the [`EventStore`] rather than pointers, so walking
//! the chain needs only a shared (or, for the correction pass, exclusive)
//! borrow of the store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::EntryId;

/// Bit flags stored in [`TraceEntry::visible`].
pub mod visibility {
    /// The entry is shown in the text (list) view.
    pub const TEXT_VIEW_FILTER_MASK: u8 = 1 << 0;
    /// The entry is shown in the graph view.
    pub const GRAPH_VIEW_FILTER_MASK: u8 = 1 << 1;
    /// The entry's event is visible.
    pub const EVENT_VIEW_FILTER_MASK: u8 = 1 << 2;
    /// Cleared once a plugin has rewritten the entry.
    pub const PLUGIN_UNTOUCHED_MASK: u8 = 1 << 7;

    /// Visibility of a freshly loaded entry.
    pub const ALL: u8 = TEXT_VIEW_FILTER_MASK
        | GRAPH_VIEW_FILTER_MASK
        | EVENT_VIEW_FILTER_MASK
        | PLUGIN_UNTOUCHED_MASK;
}

/// One recorded scheduling event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Timestamp in nanoseconds.
    pub ts: u64,
    /// Owning task.
    pub pid: i32,
    /// Event kind.
    pub event_id: i16,
    pub cpu: i16,
    /// Bitmask of [`visibility`] flags.
    pub visible: u8,
    /// Chronologically next entry of the stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<EntryId>,
}

impl TraceEntry {
    /// Creates an unlinked, fully visible entry.
    pub const fn new(ts: u64, pid: i32, event_id: i16, cpu: i16) -> Self {
        Self {
            ts,
            pid,
            event_id,
            cpu,
            visible: visibility::ALL,
            next: None,
        }
    }

    /// Returns `true` until a plugin rewrites this entry.
    pub const fn is_untouched(&self) -> bool {
        self.visible & visibility::PLUGIN_UNTOUCHED_MASK != 0
    }
}

/// Errors detected while building an [`EventStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A `next` link points past the end of the store.
    #[error("entry {entry} links to {next}, but the store holds {len} entries")]
    DanglingLink {
        entry: EntryId,
        next: EntryId,
        len: usize,
    },
    /// A `next` link does not move forward, which would allow cycles.
    #[error("entry {entry} links backwards to {next}")]
    BackwardLink { entry: EntryId, next: EntryId },
    /// Entries must be stored in timestamp order.
    #[error("entry {entry} is older than its predecessor")]
    UnorderedTimestamps { entry: EntryId },
}

/// Owner of all entries of a data stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStore {
    entries: Vec<TraceEntry>,
}

impl EventStore {
    /// Builds a store, checking that entries are time ordered and that every
    /// link points strictly forward and in bounds.
    pub fn new(entries: Vec<TraceEntry>) -> Result<Self, StoreError> {
        let len = entries.len();
        for (i, entry) in entries.iter().enumerate() {
            let id = EntryId(i);
            if i > 0 && entry.ts < entries[i - 1].ts {
                return Err(StoreError::UnorderedTimestamps { entry: id });
            }
            if let Some(next) = entry.next {
                if next.index() >= len {
                    return Err(StoreError::DanglingLink {
                        entry: id,
                        next,
                        len,
                    });
                }
                if next.index() <= i {
                    return Err(StoreError::BackwardLink { entry: id, next });
                }
            }
        }
        Ok(Self { entries })
    }

    /// Links every entry to the one stored after it.
    ///
    /// The entries are expected to be in timestamp order already.
    pub fn link_in_order(mut entries: Vec<TraceEntry>) -> Result<Self, StoreError> {
        let len = entries.len();
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.next = (i + 1 < len).then_some(EntryId(i + 1));
        }
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry, or `None` if the id is out of range.
    pub fn get(&self, id: EntryId) -> Option<&TraceEntry> {
        self.entries.get(id.index())
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut TraceEntry> {
        self.entries.get_mut(id.index())
    }

    /// Returns the entry that follows `id` in the chain.
    pub fn next_of(&self, id: EntryId) -> Option<(EntryId, &TraceEntry)> {
        let next = self.get(id)?.next?;
        self.get(next).map(|entry| (next, entry))
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &TraceEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (EntryId(i), entry))
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }
}

impl std::ops::Index<EntryId> for EventStore {
    type Output = TraceEntry;

    fn index(&self, id: EntryId) -> &Self::Output {
        &self.entries[id.index()]
    }
}

impl std::ops::IndexMut<EntryId> for EventStore {
    fn index_mut(&mut self, id: EntryId) -> &mut Self::Output {
        &mut self.entries[id.index()]
    }
}
