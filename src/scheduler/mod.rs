//! Scheduler - an explicitly owned tick queue with a virtual clock.
//!
//! Stores never spawn threads or timers. Deferred work (debounced
//! recomputes, coalesced child notifications) is queued here and runs when
//! the host drives the queue:
//!
//! - [`Scheduler::flush`] runs everything due now, including tasks queued by
//!   the tasks it runs. This is the "end of the current tick" checkpoint.
//! - [`Scheduler::advance`] moves the virtual clock forward and runs tasks in
//!   due order.
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use tabletop_stores::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let ran = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&ran);
//! scheduler.schedule(250, move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! scheduler.flush();
//! assert_eq!(ran.load(Ordering::SeqCst), 0);
//! scheduler.advance(250);
//! assert_eq!(ran.load(Ordering::SeqCst), 1);
//! ```

mod debounce;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::store::lock;

pub use debounce::{DebounceState, Debouncer};

type Task = Box<dyn FnOnce() + Send>;

/// Identifies a scheduled task so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Default)]
struct Queue {
    now: u64,
    next_seq: u64,
    /// Keyed by `(due, seq)` so equal due times keep scheduling order.
    tasks: BTreeMap<(u64, u64), Task>,
    due_by_seq: HashMap<u64, u64>,
}

impl Queue {
    fn pop_due(&mut self, limit: u64) -> Option<(u64, Task)> {
        let key = *self.tasks.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let task = self.tasks.remove(&key)?;
        self.due_by_seq.remove(&key.1);
        Some((key.0, task))
    }
}

/// Cloneable handle to a shared task queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Arc<Mutex<Queue>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run `delay_ms` after the current virtual time.
    pub fn schedule<F>(&self, delay_ms: u64, task: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let mut queue = lock(&self.queue);
        let seq = queue.next_seq;
        queue.next_seq += 1;
        let due = queue.now.saturating_add(delay_ms);
        queue.tasks.insert((due, seq), Box::new(task));
        queue.due_by_seq.insert(seq, due);
        TaskId(seq)
    }

    /// Remove a task that has not run yet. Returns whether it was pending.
    pub fn cancel(&self, id: TaskId) -> bool {
        let mut queue = lock(&self.queue);
        match queue.due_by_seq.remove(&id.0) {
            Some(due) => queue.tasks.remove(&(due, id.0)).is_some(),
            None => false,
        }
    }

    /// Run every task due at the current time. Returns how many ran.
    pub fn flush(&self) -> usize {
        self.advance(0)
    }

    /// Move the clock forward by `ms`, running due tasks in order.
    pub fn advance(&self, ms: u64) -> usize {
        let target = lock(&self.queue).now.saturating_add(ms);
        let mut ran = 0;

        loop {
            let next = {
                let mut queue = lock(&self.queue);
                let next = queue.pop_due(target);
                if let Some((due, _)) = &next {
                    queue.now = queue.now.max(*due);
                }
                next
            };

            match next {
                Some((_, task)) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }

        lock(&self.queue).now = target;
        ran
    }

    /// Run tasks until the queue is empty, moving the clock as needed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(due) = self.next_due() {
            let now = self.now();
            ran += self.advance(due.saturating_sub(now));
        }
        ran
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        lock(&self.queue).now
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<u64> {
        lock(&self.queue).tasks.keys().next().map(|(due, _)| *due)
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        lock(&self.queue).tasks.len()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = lock(&self.queue);
        f.debug_struct("Scheduler")
            .field("now", &queue.now)
            .field("pending", &queue.tasks.len())
            .finish()
    }
}
