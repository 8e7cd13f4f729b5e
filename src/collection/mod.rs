//! Collections - ordered, id-indexed sets of entry stores.
//!
//! [`ArrayObjectStore`] owns entry lifecycle and bubbles entry changes up to
//! its own subscribers after a debounce. [`CrudArrayObjectStore`] adds a
//! dispatch hook that reports local changes to an external persistence
//! service as [`CrudIntent`]s.

mod array_store;
mod crud;
mod options;
mod reducer;

pub use array_store::{ArrayObjectStore, PendingEntries, SubscriberUpdate};
pub use crud::{CrudAction, CrudArrayObjectStore, CrudDispatch, CrudIntent, CrudStoreOptions};
pub use options::{ArrayStoreOptions, DEFAULT_CHILD_DEBOUNCE, MAX_CHILD_DEBOUNCE};
pub use reducer::{DataReducer, FilterId};
