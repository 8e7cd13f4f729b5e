//! Stores - minimal reactive containers shared by every component.
//!
//! Every store in this crate follows the same subscription contract: a
//! handler is called once, synchronously, with the current value when it
//! subscribes, then again after every committed change.
//!
//! ## Example
//!
//! ```
//! use tabletop_stores::{Readable, SettableStore, WritableStore};
//!
//! let count = WritableStore::new(1);
//! let unsubscribe = count.subscribe(|value| println!("count = {}", value));
//!
//! count.set(2);
//! count.set(2); // equal value, no notification
//! unsubscribe.unsubscribe();
//! ```

mod subscribers;
mod writable;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use subscribers::{Subscribers, Unsubscribe};
pub use writable::WritableStore;

/// A store that can be observed.
pub trait Readable<T: ?Sized> {
    /// Register a handler. It is invoked immediately with the current value.
    fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&T) + Send + Sync + 'static;
}

/// A store whose value can be replaced from outside.
pub trait SettableStore<T>: Readable<T> {
    /// Replace the value, notifying subscribers when it changed.
    fn set(&self, value: T);

    /// Current value.
    fn get(&self) -> T;

    /// Derive a new value from the current one and store it.
    fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.get());
        self.set(next);
    }
}

/// Lock a mutex, recovering the data if a panicking handler poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
