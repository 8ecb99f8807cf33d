//! Second pass over the `sched_switch` entries.
//!
//! While loading, every `sched_switch` entry is retagged with the pid of the
//! task switched *in*, so the switch becomes the first entry of the next
//! task's run. The switch is not always the last event of the outgoing task,
//! though. Trailing events (printk and friends) recorded after it still carry
//! the old pid and stretch that task's graph past its real end.
//!
//! This pass walks the `next` chain behind each switch to find the last of
//! those trailing events and hands it to the incoming task, marking it as
//! rewritten by clearing [`PLUGIN_UNTOUCHED_MASK`].
//!
//! [`PLUGIN_UNTOUCHED_MASK`]: crate::visibility::PLUGIN_UNTOUCHED_MASK

use crate::container::FieldContainer;
use crate::entry::{EventStore, visibility};
use crate::sched_field;
use crate::types::EntryId;

/// Counters reported by [`correct`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionStats {
    /// Switch entries that had trailing events of the outgoing task.
    pub examined: usize,
    /// Entries whose pid was rewritten.
    pub corrected: usize,
}

/// Runs the correction over every entry of the switch container.
///
/// Running it again over already corrected data changes nothing.
pub fn correct(store: &mut EventStore, switch_data: &FieldContainer) -> CorrectionStats {
    let mut stats = CorrectionStats::default();

    for data in switch_data {
        let pid_rec = sched_field::pid(data.field);
        let switch = &store[data.entry];
        let Some((_, next)) = store.next_of(data.entry) else {
            continue;
        };
        if switch.pid == 0 || switch.event_id == next.event_id || pid_rec != next.pid {
            continue;
        }
        // Switched back to itself.
        if switch.pid == pid_rec {
            continue;
        }

        stats.examined += 1;
        let switched_in = switch.pid;
        if let Some(last) = last_trailing_entry(store, data.entry, pid_rec, switched_in) {
            let entry = &mut store[last];
            tracing::trace!(
                entry = %last,
                ts = entry.ts,
                from = entry.pid,
                to = switched_in,
                "retagging trailing event"
            );
            entry.pid = switched_in;
            entry.visible &= !visibility::PLUGIN_UNTOUCHED_MASK;
            stats.corrected += 1;
        }
    }

    tracing::debug!(
        switches = switch_data.len(),
        examined = stats.examined,
        corrected = stats.corrected,
        "sched_switch correction done"
    );
    stats
}

/// Follows the chain from `start` while the successor still belongs to
/// `pid_rec` and returns the last such entry.
///
/// Returns `None` if the chain ends first, or if the entry that ends the run
/// was already handed to `switched_in` by an earlier pass.
fn last_trailing_entry(
    store: &EventStore,
    start: EntryId,
    pid_rec: i32,
    switched_in: i32,
) -> Option<EntryId> {
    let mut current = start;
    while let Some((next_id, next)) = store.next_of(current) {
        if next.pid != pid_rec {
            if !next.is_untouched() && next.pid == switched_in {
                return None;
            }
            return Some(current);
        }
        current = next_id;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::TraceEntry;

    const SWITCH: i16 = 1;
    const PRINT: i16 = 2;
    const WAKING: i16 = 3;

    /// Builds a linked store and a switch container from
    /// `(pid, event_id, recorded pid)` triples; the recorded pid is only used
    /// for switch entries.
    fn fixture(rows: &[(i32, i16, i32)]) -> (EventStore, FieldContainer) {
        let entries = rows
            .iter()
            .zip(0u64..)
            .map(|(&(pid, event_id, _), ts)| TraceEntry::new(ts * 10, pid, event_id, 0))
            .collect();
        let store = EventStore::link_in_order(entries).unwrap();

        let mut switches = FieldContainer::new();
        for (i, &(_, event_id, recorded)) in rows.iter().enumerate() {
            if event_id == SWITCH {
                switches.append(EntryId(i), sched_field::encode(recorded.into(), 0));
            }
        }
        switches.sort_by_time(&store);
        (store, switches)
    }

    fn pids(store: &EventStore) -> Vec<i32> {
        store.iter().map(|(_, e)| e.pid).collect()
    }

    #[test]
    fn retags_last_trailing_event() {
        // Entry 3 (index 2) switches 7 out and 9 in; two trailing events of 7
        // follow, then a real event of 9.
        let (mut store, switches) = fixture(&[
            (7, PRINT, 0),
            (7, PRINT, 0),
            (9, SWITCH, 7),
            (7, PRINT, 0),
            (7, PRINT, 0),
            (9, PRINT, 0),
        ]);

        let stats = correct(&mut store, &switches);

        assert_eq!(pids(&store), vec![7, 7, 9, 7, 9, 9]);
        assert!(!store[EntryId(4)].is_untouched());
        for i in [0, 1, 2, 3, 5] {
            assert!(store[EntryId(i)].is_untouched(), "entry {i} was touched");
        }
        assert_eq!(
            stats,
            CorrectionStats {
                examined: 1,
                corrected: 1
            }
        );
    }

    #[test]
    fn second_run_is_a_no_op() {
        let (mut store, switches) = fixture(&[
            (9, SWITCH, 7),
            (7, PRINT, 0),
            (7, PRINT, 0),
            (7, PRINT, 0),
            (9, PRINT, 0),
        ]);

        correct(&mut store, &switches);
        let once = store.clone();
        let stats = correct(&mut store, &switches);

        assert_eq!(store, once);
        assert_eq!(stats.corrected, 0);
        assert_eq!(pids(&store), vec![9, 7, 7, 9, 9]);
    }

    #[test]
    fn rerun_over_several_switches_changes_nothing() {
        let (mut store, switches) = fixture(&[
            (9, SWITCH, 7),
            (7, PRINT, 0),
            (7, PRINT, 0),
            (9, PRINT, 0),
            (7, SWITCH, 9),
            (9, PRINT, 0),
            (7, PRINT, 0),
            (7, SWITCH, 7),
            (7, PRINT, 0),
            (5, PRINT, 0),
        ]);

        let first = correct(&mut store, &switches);
        let once = store.clone();
        let second = correct(&mut store, &switches);

        assert_eq!(first.corrected, 2);
        assert_eq!(pids(&once), vec![9, 7, 9, 9, 7, 7, 7, 7, 7, 5]);
        assert_eq!(second.corrected, 0);
        assert_eq!(store, once);
    }

    #[test]
    fn switch_back_to_same_task_is_skipped() {
        let (mut store, switches) = fixture(&[(7, SWITCH, 7), (7, PRINT, 0), (5, PRINT, 0)]);

        let stats = correct(&mut store, &switches);

        assert_eq!(stats, CorrectionStats::default());
        assert!(store.iter().all(|(_, e)| e.is_untouched()));
    }

    #[test]
    fn single_trailing_event_is_skipped_on_rerun() {
        let (mut store, switches) = fixture(&[(9, SWITCH, 7), (7, PRINT, 0), (9, PRINT, 0)]);

        assert_eq!(correct(&mut store, &switches).corrected, 1);
        let stats = correct(&mut store, &switches);

        assert_eq!(stats, CorrectionStats::default());
        assert_eq!(pids(&store), vec![9, 9, 9]);
    }

    #[test]
    fn chain_end_leaves_entries_alone() {
        let (mut store, switches) = fixture(&[(9, SWITCH, 7), (7, PRINT, 0), (7, PRINT, 0)]);

        let stats = correct(&mut store, &switches);

        assert_eq!(stats.examined, 1);
        assert_eq!(stats.corrected, 0);
        assert_eq!(pids(&store), vec![9, 7, 7]);
        assert!(store.iter().all(|(_, e)| e.is_untouched()));
    }

    #[test]
    fn skips_switch_to_idle() {
        let (mut store, switches) = fixture(&[(0, SWITCH, 7), (7, PRINT, 0), (0, PRINT, 0)]);
        assert_eq!(correct(&mut store, &switches), CorrectionStats::default());
        assert_eq!(pids(&store), vec![0, 7, 0]);
    }

    #[test]
    fn skips_when_successor_has_same_kind() {
        let (mut store, switches) = fixture(&[(9, SWITCH, 7), (7, SWITCH, 9), (9, PRINT, 0)]);
        let before = store.clone();
        correct(&mut store, &switches);
        assert_eq!(store, before);
    }

    #[test]
    fn skips_when_successor_belongs_to_another_task() {
        let (mut store, switches) = fixture(&[(9, SWITCH, 7), (9, WAKING, 0), (7, PRINT, 0)]);
        let before = store.clone();
        assert_eq!(correct(&mut store, &switches).examined, 0);
        assert_eq!(store, before);
    }

    #[test]
    fn skips_last_entry_of_stream() {
        let (mut store, switches) = fixture(&[(7, PRINT, 0), (9, SWITCH, 7)]);
        assert_eq!(correct(&mut store, &switches), CorrectionStats::default());
    }

    #[test]
    fn empty_container_is_a_no_op() {
        let (mut store, _) = fixture(&[(7, PRINT, 0)]);
        let stats = correct(&mut store, &FieldContainer::new());
        assert_eq!(stats, CorrectionStats::default());
    }

    #[test]
    fn independent_switches_are_corrected_separately() {
        let (mut store, switches) = fixture(&[
            (9, SWITCH, 7),
            (7, PRINT, 0),
            (9, PRINT, 0),
            (5, SWITCH, 9),
            (9, PRINT, 0),
            (9, PRINT, 0),
            (5, PRINT, 0),
        ]);

        let stats = correct(&mut store, &switches);

        assert_eq!(stats.corrected, 2);
        assert_eq!(pids(&store), vec![9, 9, 9, 5, 9, 5, 5]);
    }
}
