use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use libc::pid_t;

use super::TermStatus;

/// A background completion, formatted only when the main loop prints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub pid: pid_t,
    pub status: TermStatus,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background pid {} is done: {}", self.pid, self.status)
    }
}

struct Slot {
    pid: AtomicI32,
    raw: AtomicI32,
}

impl Slot {
    const fn new() -> Self {
        Self {
            pid: AtomicI32::new(0),
            raw: AtomicI32::new(0),
        }
    }
}

/// Result of emptying the queue.
#[derive(Debug, Default)]
pub struct Drained {
    pub notifications: Vec<Notification>,
    pub dropped: usize,
}

/// Bounded single-producer, single-consumer ring of reaped children.
///
/// The producer is the child-reaped handler, which only stores the raw pid and
/// wait status; the consumer is the main loop. The producer may interrupt the
/// consumer anywhere inside `drain`: it only ever writes the slot at `tail`,
/// which is outside the range the consumer is reading until `tail` is
/// published. When the ring is full the newest event is dropped and counted.
pub struct NotificationQueue<const N: usize> {
    slots: [Slot; N],
    head: AtomicUsize,
    tail: AtomicUsize,
    dropped: AtomicUsize,
}

impl<const N: usize> Default for NotificationQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> NotificationQueue<N> {
    pub const fn new() -> Self {
        Self {
            slots: [const { Slot::new() }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Appends at the tail. Never blocks and never allocates.
    pub fn push(&self, pid: pid_t, raw_status: libc::c_int) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= N {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let slot = &self.slots[tail % N];
        slot.pid.store(pid, Ordering::Relaxed);
        slot.raw.store(raw_status, Ordering::Relaxed);
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }

    pub fn len(&self) -> usize {
        self.tail
            .load(Ordering::Acquire)
            .wrapping_sub(self.head.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every pending notification in insertion order.
    pub fn drain(&self) -> Drained {
        let mut head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        let mut notifications = Vec::with_capacity(tail.wrapping_sub(head));
        while head != tail {
            let slot = &self.slots[head % N];
            notifications.push(Notification {
                pid: slot.pid.load(Ordering::Relaxed),
                status: TermStatus::from_raw(slot.raw.load(Ordering::Relaxed)),
            });
            head = head.wrapping_add(1);
        }
        self.head.store(head, Ordering::Release);

        Drained {
            notifications,
            dropped: self.dropped.swap(0, Ordering::Relaxed),
        }
    }

    /// Drains the queue and prints one line per completion.
    pub fn report(&self, out: &mut dyn Write) -> io::Result<usize> {
        let drained = self.drain();
        if drained.dropped > 0 {
            tracing::warn!(dropped = drained.dropped, "completion notices lost to a full queue");
        }
        for notification in &drained.notifications {
            writeln!(out, "{}", notification)?;
        }
        out.flush()?;
        Ok(drained.notifications.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exited(code: i32) -> libc::c_int {
        code << 8
    }

    #[test]
    fn test_starts_empty() {
        let queue: NotificationQueue<4> = NotificationQueue::new();
        assert!(queue.is_empty());
        let drained = queue.drain();
        assert!(drained.notifications.is_empty());
        assert_eq!(drained.dropped, 0);
    }

    #[test]
    fn test_drain_keeps_reap_order() {
        let queue: NotificationQueue<4> = NotificationQueue::new();
        queue.push(300, exited(0));
        queue.push(100, libc::SIGTERM);
        queue.push(200, exited(3));

        let pids: Vec<pid_t> = queue.drain().notifications.iter().map(|n| n.pid).collect();
        assert_eq!(pids, vec![300, 100, 200]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_message_format() {
        let queue: NotificationQueue<4> = NotificationQueue::new();
        queue.push(4242, exited(0));
        queue.push(4243, libc::SIGTERM);

        let lines: Vec<String> = queue
            .drain()
            .notifications
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            lines,
            vec![
                "background pid 4242 is done: exit value 0",
                "background pid 4243 is done: terminated by signal 15",
            ]
        );
    }

    #[test]
    fn test_report_prints_and_empties() {
        let queue: NotificationQueue<4> = NotificationQueue::new();
        queue.push(11, exited(1));
        queue.push(12, libc::SIGKILL);

        let mut out: Vec<u8> = Vec::new();
        assert_eq!(queue.report(&mut out).unwrap(), 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "background pid 11 is done: exit value 1\nbackground pid 12 is done: terminated by signal 9\n"
        );

        let mut out: Vec<u8> = Vec::new();
        assert_eq!(queue.report(&mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_overflow_drops_newest() {
        let queue: NotificationQueue<2> = NotificationQueue::new();
        assert!(queue.push(1, 0));
        assert!(queue.push(2, 0));
        assert!(!queue.push(3, 0));

        let drained = queue.drain();
        let pids: Vec<pid_t> = drained.notifications.iter().map(|n| n.pid).collect();
        assert_eq!(pids, vec![1, 2]);
        assert_eq!(drained.dropped, 1);
        assert_eq!(queue.drain().dropped, 0);
    }

    #[test]
    fn test_ring_wraps_around() {
        let queue: NotificationQueue<2> = NotificationQueue::new();
        for round in 0..5 {
            queue.push(round * 2 + 1, 0);
            queue.push(round * 2 + 2, 0);
            let pids: Vec<pid_t> = queue.drain().notifications.iter().map(|n| n.pid).collect();
            assert_eq!(pids, vec![round * 2 + 1, round * 2 + 2]);
        }
    }
}
