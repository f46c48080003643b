//! Delayed reclamation: the expiry-ordered holding queue and the background
//! sweeper that services it.
//!
//! Instances released with a delay are parked here until their expiry
//! passes. One sweeper thread per pool wakes on a fixed interval, pops
//! everything whose expiry has elapsed, and routes it through the ordinary
//! immediate-release path. The queue lock is independent of the free-list
//! lock and is always released before the free-list lock is taken.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::binary_heap::PeekMut;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::Mutex;

/// One parked instance and the moment it becomes reclaimable.
struct DelayedEntry<T> {
    expiry: Instant,
    value: T,
}

// Heap order is inverted so the earliest expiry surfaces first. Entries with
// equal expiries compare equal; their relative order is unspecified.
impl<T> Ord for DelayedEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.expiry.cmp(&self.expiry)
    }
}

impl<T> PartialOrd for DelayedEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for DelayedEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.expiry == other.expiry
    }
}

impl<T> Eq for DelayedEntry<T> {}

/// Min-structure of parked instances, ordered by expiry.
pub(crate) struct DelayedQueue<T> {
    heap: Mutex<BinaryHeap<DelayedEntry<T>>>,
}

impl<T> DelayedQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
        }
    }

    /// Park an instance until `delay` from now has elapsed.
    pub fn schedule(&self, value: T, delay: Duration) {
        let expiry = Instant::now() + delay;
        self.heap.lock().push(DelayedEntry { expiry, value });
    }

    /// Remove and return every entry whose expiry is at or before `now`.
    pub fn pop_expired(&self, now: Instant) -> Vec<T> {
        let mut heap = self.heap.lock();
        let mut expired = Vec::new();
        while let Some(entry) = heap.peek_mut() {
            if entry.expiry > now {
                break;
            }
            expired.push(PeekMut::pop(entry).value);
        }
        expired
    }

    /// Empty the queue regardless of expiry. Used by `clear` and teardown so
    /// no parked instance is ever abandoned.
    pub fn drain_all(&self) -> Vec<T> {
        self.heap.lock().drain().map(|entry| entry.value).collect()
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }
}

/// Handle to the background sweeper thread.
///
/// Dropping (or explicitly stopping) the sweeper sends the stop signal and
/// joins the thread, so the in-flight sweep finishes before teardown
/// proceeds to drain the queues.
pub(crate) struct Sweeper {
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn the sweeper thread. `tick` runs once per interval and returns
    /// `false` when the pool it serves no longer exists.
    pub fn spawn<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (stop, signal) = channel::bounded::<()>(1);
        let thread = std::thread::Builder::new()
            .name("repool-sweep".into())
            .spawn(move || {
                loop {
                    match signal.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !tick() {
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .expect("failed to spawn sweeper thread");

        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Signal the thread to stop and wait for the current iteration to
    /// finish. Idempotent.
    pub fn stop(&mut self) {
        let _ = self.stop.try_send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[test]
    fn pop_expired_returns_only_elapsed_entries() {
        let queue = DelayedQueue::new();
        queue.schedule("soon", Duration::ZERO);
        queue.schedule("later", Duration::from_secs(60));

        let expired = queue.pop_expired(Instant::now());
        assert_eq!(expired, vec!["soon"]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn pop_expired_yields_earliest_first() {
        let queue = DelayedQueue::new();
        queue.schedule(2u32, Duration::from_millis(2));
        queue.schedule(1u32, Duration::from_millis(1));
        queue.schedule(3u32, Duration::from_millis(3));

        let expired = queue.pop_expired(Instant::now() + Duration::from_secs(1));
        assert_eq!(expired, vec![1, 2, 3]);
    }

    #[test]
    fn drain_all_ignores_expiry() {
        let queue = DelayedQueue::new();
        queue.schedule(1u32, Duration::from_secs(60));
        queue.schedule(2u32, Duration::from_secs(120));

        let mut drained = queue.drain_all();
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn sweeper_ticks_then_stops_on_signal() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&ticks);
        let mut sweeper = Sweeper::spawn(Duration::from_millis(5), move || {
            seen.fetch_add(1, AtomicOrdering::SeqCst);
            true
        });

        std::thread::sleep(Duration::from_millis(50));
        sweeper.stop();
        let after_stop = ticks.load(AtomicOrdering::SeqCst);
        assert!(after_stop >= 1);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks.load(AtomicOrdering::SeqCst), after_stop);
    }

    #[test]
    fn sweeper_exits_when_tick_reports_dead_pool() {
        let mut sweeper = Sweeper::spawn(Duration::from_millis(1), || false);
        std::thread::sleep(Duration::from_millis(20));
        // join returns promptly because the thread already exited
        sweeper.stop();
    }
}
