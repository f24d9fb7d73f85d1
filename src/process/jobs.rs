use std::sync::atomic::{AtomicI32, Ordering};

use libc::pid_t;

const EMPTY: pid_t = 0;

/// Fixed set of background pids the shell still believes to be running.
///
/// Every slot is a single atomic word holding either `EMPTY` or one pid, so
/// the child-reaped handler can remove an entry at any point of a main-flow
/// insert without observing a half-written slot. Slots are reused by index
/// and scanned linearly; order carries no meaning.
pub struct JobTable<const N: usize> {
    slots: [AtomicI32; N],
}

impl<const N: usize> Default for JobTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> JobTable<N> {
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicI32::new(EMPTY) }; N],
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Claims the first empty slot for `pid`. Returns `false` when the table
    /// is full or the pid is already tracked; the caller treats both as
    /// "untracked" rather than as an error.
    pub fn insert(&self, pid: pid_t) -> bool {
        if pid <= EMPTY || self.contains(pid) {
            return false;
        }
        self.slots.iter().any(|slot| {
            slot.compare_exchange(EMPTY, pid, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        })
    }

    /// Releases the slot holding `pid`. Safe to call from signal context.
    pub fn remove(&self, pid: pid_t) -> bool {
        if pid <= EMPTY {
            return false;
        }
        self.slots.iter().any(|slot| {
            slot.compare_exchange(pid, EMPTY, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        })
    }

    pub fn contains(&self, pid: pid_t) -> bool {
        pid > EMPTY
            && self
                .slots
                .iter()
                .any(|slot| slot.load(Ordering::Acquire) == pid)
    }

    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.load(Ordering::Acquire) != EMPTY)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties every slot, returning the pids that were still tracked.
    pub fn drain(&self) -> Vec<pid_t> {
        self.slots
            .iter()
            .map(|slot| slot.swap(EMPTY, Ordering::AcqRel))
            .filter(|&pid| pid != EMPTY)
            .collect()
    }

    /// Sends `SIGTERM` to every tracked pid and forgets them all.
    pub fn terminate_all(&self) -> usize {
        let pids = self.drain();
        for &pid in &pids {
            // SAFETY: kill(2) has no memory-safety preconditions.
            if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
                tracing::debug!(pid, error = %std::io::Error::last_os_error(), "job already gone");
            }
        }
        pids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let table: JobTable<4> = JobTable::new();
        assert!(table.is_empty());
        assert!(table.insert(100));
        assert!(table.insert(200));
        assert!(table.contains(100));
        assert_eq!(table.len(), 2);

        assert!(table.remove(100));
        assert!(!table.contains(100));
        assert!(!table.remove(100));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_no_duplicate_pids() {
        let table: JobTable<4> = JobTable::new();
        assert!(table.insert(42));
        assert!(!table.insert(42));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_full_table_leaves_pid_untracked() {
        let table: JobTable<2> = JobTable::new();
        assert!(table.insert(1));
        assert!(table.insert(2));
        assert!(!table.insert(3));
        assert!(!table.contains(3));
        assert_eq!(table.len(), table.capacity());
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let table: JobTable<2> = JobTable::new();
        table.insert(1);
        table.insert(2);
        table.remove(1);
        assert!(table.insert(3));
        assert!(table.contains(3));
    }

    #[test]
    fn test_rejects_sentinel() {
        let table: JobTable<2> = JobTable::new();
        assert!(!table.insert(0));
        assert!(!table.insert(-1));
        assert!(!table.remove(0));
        assert!(table.is_empty());
    }

    #[test]
    fn test_drain_clears_table() {
        let table: JobTable<8> = JobTable::new();
        for pid in [10, 20, 30] {
            table.insert(pid);
        }
        let mut drained = table.drain();
        drained.sort_unstable();
        assert_eq!(drained, vec![10, 20, 30]);
        assert!(table.is_empty());
        assert!(table.drain().is_empty());
    }
}
