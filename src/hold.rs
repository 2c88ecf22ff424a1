//! Held response gate.
//!
//! Responses flagged `hold` park their caller in a per-contract FIFO queue.
//! In manual mode a parked call resolves only when the contract is released;
//! in timed mode every hold resolves on its own after a fixed delay.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// How held responses are resolved. Fixed for the lifetime of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldMode {
    /// Resolve only on an explicit release
    #[default]
    Manual,
    /// Resolve automatically after the delay
    Timed(Duration),
}

/// Per-contract queues of suspended resolutions.
#[derive(Debug, Default)]
pub struct HoldGate {
    mode: HoldMode,
    waiters: Mutex<HashMap<String, VecDeque<oneshot::Sender<()>>>>,
}

/// A registered hold. Awaiting [`HoldTicket::wait`] is the suspension point.
#[derive(Debug)]
pub struct HoldTicket {
    inner: TicketInner,
}

#[derive(Debug)]
enum TicketInner {
    Manual(oneshot::Receiver<()>),
    Timed(Duration),
}

impl HoldTicket {
    /// Wait until the hold is lifted.
    pub async fn wait(self) {
        match self.inner {
            // A closed channel means the gate is gone; nothing left to wait for
            TicketInner::Manual(rx) => {
                let _ = rx.await;
            }
            TicketInner::Timed(delay) => tokio::time::sleep(delay).await,
        }
    }
}

impl HoldGate {
    pub fn new(mode: HoldMode) -> Self {
        Self {
            mode,
            waiters: Mutex::new(HashMap::new()),
        }
    }

    pub fn mode(&self) -> HoldMode {
        self.mode
    }

    /// Register a hold for `key` at the back of its queue.
    pub fn enqueue(&self, key: &str) -> HoldTicket {
        let inner = match self.mode {
            HoldMode::Manual => {
                let (tx, rx) = oneshot::channel();
                let mut waiters = self.waiters.lock();
                let queue = waiters.entry(key.to_string()).or_default();
                queue.push_back(tx);
                debug!(contract = %key, pending = queue.len(), "Response held");
                TicketInner::Manual(rx)
            }
            HoldMode::Timed(delay) => {
                debug!(
                    contract = %key,
                    delay_ms = delay.as_millis() as u64,
                    "Response held for fixed delay"
                );
                TicketInner::Timed(delay)
            }
        };
        HoldTicket { inner }
    }

    /// Wake the oldest pending hold for `key`.
    ///
    /// Returns `false` when nothing was pending. Waiters whose caller has
    /// gone away are discarded on the way.
    pub fn release(&self, key: &str) -> bool {
        let mut waiters = self.waiters.lock();
        let Some(queue) = waiters.get_mut(key) else {
            return false;
        };

        let mut released = false;
        while let Some(tx) = queue.pop_front() {
            if tx.send(()).is_ok() {
                released = true;
                break;
            }
        }
        if queue.is_empty() {
            waiters.remove(key);
        }

        debug!(contract = %key, released, "Hold release requested");
        released
    }

    /// Number of holds waiting on `key`.
    pub fn pending(&self, key: &str) -> usize {
        self.waiters
            .lock()
            .get(key)
            .map(|queue| queue.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_release_without_waiters() {
        let gate = HoldGate::new(HoldMode::Manual);
        assert!(!gate.release("missing"));
        assert_eq!(gate.pending("missing"), 0);
    }

    #[test]
    fn test_manual_release() {
        let gate = HoldGate::new(HoldMode::Manual);
        let mut waiting = task::spawn(gate.enqueue("contract").wait());

        assert_pending!(waiting.poll());
        assert_eq!(gate.pending("contract"), 1);

        assert!(gate.release("contract"));
        assert!(waiting.is_woken());
        assert_ready!(waiting.poll());

        assert!(!gate.release("contract"));
    }

    #[test]
    fn test_release_is_fifo() {
        let gate = HoldGate::new(HoldMode::Manual);
        let mut first = task::spawn(gate.enqueue("contract").wait());
        let mut second = task::spawn(gate.enqueue("contract").wait());

        assert_pending!(first.poll());
        assert_pending!(second.poll());

        gate.release("contract");
        assert_ready!(first.poll());
        assert_pending!(second.poll());

        gate.release("contract");
        assert_ready!(second.poll());
    }

    #[test]
    fn test_queues_are_per_key() {
        let gate = HoldGate::new(HoldMode::Manual);
        let mut a = task::spawn(gate.enqueue("a").wait());
        let mut b = task::spawn(gate.enqueue("b").wait());

        gate.release("b");
        assert_pending!(a.poll());
        assert_ready!(b.poll());
    }

    #[test]
    fn test_release_skips_dropped_waiters() {
        let gate = HoldGate::new(HoldMode::Manual);
        let dropped = gate.enqueue("contract");
        let mut live = task::spawn(gate.enqueue("contract").wait());
        drop(dropped);

        assert_eq!(gate.pending("contract"), 1);
        assert!(gate.release("contract"));
        assert_ready!(live.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_mode_resolves_after_delay() {
        let gate = HoldGate::new(HoldMode::Timed(Duration::from_millis(250)));
        let start = tokio::time::Instant::now();

        gate.enqueue("contract").wait().await;

        assert!(start.elapsed() >= Duration::from_millis(250));
        assert_eq!(gate.pending("contract"), 0);
        assert!(!gate.release("contract"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_holds_run_concurrently() {
        let gate = Arc::new(HoldGate::new(HoldMode::Timed(Duration::from_millis(100))));
        let done = Arc::new(AtomicUsize::new(0));
        let start = tokio::time::Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let gate = gate.clone();
                let done = done.clone();
                tokio::spawn(async move {
                    gate.enqueue("contract").wait().await;
                    done.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
