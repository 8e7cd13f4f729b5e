use std::fmt;
use std::sync::{Arc, Mutex};

use super::{Scheduler, TaskId};
use crate::store::lock;

/// State of a [`Debouncer`].
#[derive(Debug, Clone, PartialEq)]
pub enum DebounceState<A> {
    Idle,
    Pending { task: TaskId, partial: A },
}

type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

/// Trailing-edge debounce over an explicit accumulator value.
///
/// Every [`push`](Debouncer::push) folds new input into the pending
/// accumulator and restarts the delay. When the delay elapses the callback
/// receives the accumulator by value and the debouncer returns to `Idle`.
pub struct Debouncer<A> {
    scheduler: Scheduler,
    delay_ms: u64,
    state: Arc<Mutex<DebounceState<A>>>,
    callback: Callback<A>,
}

impl<A> Debouncer<A>
where
    A: Default + Send + 'static,
{
    pub fn new<F>(scheduler: Scheduler, delay_ms: u64, callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            scheduler,
            delay_ms,
            state: Arc::new(Mutex::new(DebounceState::Idle)),
            callback: Arc::new(callback),
        }
    }

    /// Fold input into the accumulator and (re)start the delay.
    pub fn push<F>(&self, merge: F)
    where
        F: FnOnce(A) -> A,
    {
        let mut state = lock(&self.state);
        let partial = match std::mem::replace(&mut *state, DebounceState::Idle) {
            DebounceState::Idle => A::default(),
            DebounceState::Pending { task, partial } => {
                self.scheduler.cancel(task);
                partial
            }
        };
        let partial = merge(partial);

        let shared = Arc::clone(&self.state);
        let callback = Arc::clone(&self.callback);
        let task = self.scheduler.schedule(self.delay_ms, move || {
            let fired = {
                let mut state = lock(&shared);
                match std::mem::replace(&mut *state, DebounceState::Idle) {
                    DebounceState::Pending { partial, .. } => Some(partial),
                    DebounceState::Idle => None,
                }
            };
            if let Some(partial) = fired {
                callback(partial);
            }
        });

        *state = DebounceState::Pending { task, partial };
    }

    /// Drop pending input without running the callback.
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        if let DebounceState::Pending { task, .. } =
            std::mem::replace(&mut *state, DebounceState::Idle)
        {
            self.scheduler.cancel(task);
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(*lock(&self.state), DebounceState::Pending { .. })
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }
}

impl<A> fmt::Debug for Debouncer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = matches!(*lock(&self.state), DebounceState::Pending { .. });
        f.debug_struct("Debouncer")
            .field("delay_ms", &self.delay_ms)
            .field("pending", &pending)
            .finish()
    }
}
