use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Delays below this many milliseconds run on the next poll instead of a timer.
pub const IMMEDIATE_THRESHOLD_MS: u64 = 4;

pub trait Clock {
    /// Monotonic milliseconds since an arbitrary origin.
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    id: TimerId,
    due_ms: u64,
    payload: T,
}

/// Cancellable one-shot timers, fired in (due time, scheduling order) order.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire `delay_ms` after `now_ms`.
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, payload: T) -> TimerId {
        let due_ms = if delay_ms < IMMEDIATE_THRESHOLD_MS {
            now_ms
        } else {
            now_ms.saturating_add(delay_ms)
        };

        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due_ms,
            payload,
        });
        id
    }

    /// Remove a timer. Returns its payload and due time if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> Option<(u64, T)> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(pos);
        Some((entry.due_ms, entry.payload))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due_ms).min()
    }

    /// Take the earliest timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, T)> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.id))
            .map(|(pos, _)| pos)?;
        let entry = self.entries.remove(pos);
        Some((entry.id, entry.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_then_fifo_order() {
        let mut q = TimerQueue::new();
        q.schedule(0, 50, "late");
        q.schedule(0, 1, "immediate-a");
        q.schedule(0, 10, "ten");
        q.schedule(0, 0, "immediate-b");

        let mut fired = Vec::new();
        while let Some((_, p)) = q.pop_due(100) {
            fired.push(p);
        }
        assert_eq!(fired, vec!["immediate-a", "immediate-b", "ten", "late"]);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut q = TimerQueue::new();
        let a = q.schedule(0, 10, 'a');
        q.schedule(0, 20, 'b');
        assert_eq!(q.cancel(a), Some((10, 'a')));
        assert_eq!(q.cancel(a), None);
        assert_eq!(q.pop_due(15), None);
        assert_eq!(q.next_due_ms(), Some(20));
        assert_eq!(q.pop_due(20).map(|(_, p)| p), Some('b'));
        assert!(q.is_empty());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(250);
        assert_eq!(other.now_ms(), 250);
        other.set(1000);
        assert_eq!(clock.now_ms(), 1000);
    }
}
