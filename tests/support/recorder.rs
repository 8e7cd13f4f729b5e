use std::sync::{Arc, Mutex};

use tabletop_stores::{EntryStore, Readable, Unsubscribe};

/// Collects every value a subscriber sees.
pub struct Recorder<T> {
    seen: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            seen: Arc::clone(&self.seen),
        }
    }
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push(&self, value: T) {
        self.seen.lock().unwrap().push(value);
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn values(&self) -> Vec<T> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<T> {
        self.seen.lock().unwrap().last().cloned()
    }
}

/// Subscribe to a collection, recording the entry ids of every push.
pub fn record_ids<S, R>(store: &R) -> (Recorder<Vec<String>>, Unsubscribe)
where
    S: EntryStore,
    R: Readable<[Arc<S>]>,
{
    let recorder = Recorder::new();
    let sink = recorder.clone();
    let unsubscribe = store.subscribe(move |entries: &[Arc<S>]| {
        sink.push(entries.iter().map(|entry| entry.id().to_string()).collect());
    });
    (recorder, unsubscribe)
}
