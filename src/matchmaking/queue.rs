use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Order-preserving waiting queue with O(1) duplicate checks
///
/// The deque and the companion set are mutated together under one lock and
/// stay consistent on every path, including the rollback of a batch that
/// came up short.
struct QueueState {
    order: VecDeque<String>,
    queued: HashSet<String>,
}

/// Outcome of one batch withdrawal attempt
enum Withdrawal {
    /// A full, sentinel-free batch in arrival order
    Batch(Vec<String>),
    /// The sentinel surfaced and the batch was rolled back
    SentinelShort,
    BelowQuota,
}

/// The waiting queue plus the non-blocking matching guard
///
/// `matching` is a try-acquire guard, never a blocking lock: a caller that
/// loses the race returns immediately and relies on the winner to drain the
/// queue. The guard is held only across queue mutation, never across room
/// formation.
pub struct WaitingQueue {
    state: Mutex<QueueState>,
    matching: AtomicBool,
    quota: usize,
    sentinel: String,
}

impl WaitingQueue {
    pub fn new(quota: usize, sentinel: String) -> Self {
        Self {
            state: Mutex::new(QueueState {
                order: VecDeque::new(),
                queued: HashSet::new(),
            }),
            matching: AtomicBool::new(false),
            quota,
            sentinel,
        }
    }

    /// Adds a player to the back of the queue.
    ///
    /// Returns false without side effects for duplicates and for the
    /// simulation sentinel, which is never admitted.
    pub fn enqueue(&self, player_id: &str) -> bool {
        if player_id == self.sentinel {
            debug!(player_id = %player_id, "Simulation sentinel rejected");
            return false;
        }

        let mut state = self.state.lock().unwrap();
        if !state.queued.insert(player_id.to_string()) {
            return false;
        }
        state.order.push_back(player_id.to_string());
        true
    }

    /// Removes a player wherever it sits in the queue. Idempotent.
    pub fn dequeue(&self, player_id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        if !state.queued.remove(player_id) {
            return false;
        }
        state.order.retain(|queued| queued != player_id);
        true
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Snapshot of the queued ids in arrival order (for mirroring)
    pub fn snapshot(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.order.iter().cloned().collect()
    }

    /// Withdraws every full batch currently available.
    ///
    /// Non-blocking: when another caller holds the matching guard this
    /// returns empty and that caller picks up the work. After releasing the
    /// guard the queue length is checked again, so a batch completed by a
    /// concurrent enqueue during the critical section is never stranded.
    pub fn drain_batches(&self) -> Vec<Vec<String>> {
        let mut batches = Vec::new();

        loop {
            if self
                .matching
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                // A concurrent matcher is running; it will re-check after
                // releasing the guard and take anything we would have seen.
                return batches;
            }

            let mut wedged = false;
            loop {
                match self.withdraw_batch() {
                    Withdrawal::Batch(batch) => batches.push(batch),
                    Withdrawal::SentinelShort => {
                        wedged = true;
                        break;
                    }
                    Withdrawal::BelowQuota => break,
                }
            }

            self.matching.store(false, Ordering::Release);

            // A sentinel at the front wedges the queue until it is
            // dequeued; retrying cannot make progress.
            if wedged || self.len() < self.quota {
                return batches;
            }
        }
    }

    /// Takes exactly `quota` entries off the front, preserving arrival order.
    ///
    /// The sentinel never counts toward the quota: if it surfaces in the
    /// taken slice, everything is pushed back in original order and the
    /// attempt aborts.
    fn withdraw_batch(&self) -> Withdrawal {
        let mut state = self.state.lock().unwrap();

        if state.order.len() < self.quota {
            return Withdrawal::BelowQuota;
        }

        let taken: Vec<String> = state.order.drain(..self.quota).collect();
        let batch: Vec<String> = taken
            .iter()
            .filter(|id| **id != self.sentinel)
            .cloned()
            .collect();

        if batch.len() < self.quota {
            debug!("Batch came up short after skipping the sentinel; rolling back");
            for id in taken.into_iter().rev() {
                state.order.push_front(id);
            }
            return Withdrawal::SentinelShort;
        }

        for id in &batch {
            state.queued.remove(id);
        }

        Withdrawal::Batch(batch)
    }
}
