use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;

use super::options::ArrayStoreOptions;
use super::reducer::DataReducer;
use crate::entry::{
    ensure_id, entry_id, generate_id, is_uuid_v4, EntryData, EntryStore, ObjectEntryStore, ID_KEY,
};
use crate::error::StoreError;
use crate::scheduler::{Debouncer, Scheduler};
use crate::store::{lock, Readable, Subscribers, Unsubscribe};

/// Argument to [`ArrayObjectStore::update_subscribers`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriberUpdate {
    /// No explicit request; notify unless the store uses manual updates.
    Default,
    /// `true` always notifies. `false` defers to the manual-update gate.
    Flag(bool),
    /// One entry changed; carries its current data.
    Entry(EntryData),
}

/// Entry changes collected during one child debounce window.
///
/// Keeps the latest data per entry id, in first-changed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingEntries {
    updates: Vec<EntryData>,
}

impl PendingEntries {
    pub fn with_update(mut self, data: EntryData) -> Self {
        let existing = entry_id(&data).and_then(|id| {
            self.updates
                .iter()
                .position(|pending| entry_id(pending) == Some(id))
        });
        match existing {
            Some(pos) => self.updates[pos] = data,
            None => self.updates.push(data),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn into_updates(self) -> Vec<EntryData> {
        self.updates
    }
}

/// Called when a child debounce window closes with the entries that
/// changed in it. A returned flag overrides the manual-update gate for that
/// window.
pub(crate) trait EntryUpdateHook: Send + Sync {
    fn entries_updated(&self, updates: Vec<EntryData>) -> Option<bool>;
}

struct IndexedEntry<S> {
    entry: Arc<S>,
    unsubscribe: Unsubscribe,
}

struct ArrayState<S> {
    entries: Vec<Arc<S>>,
    index: HashMap<String, IndexedEntry<S>>,
}

impl<S: EntryStore> ArrayState<S> {
    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }

    fn remove(&mut self, id: &str) -> Option<IndexedEntry<S>> {
        let indexed = self.index.remove(id)?;
        if let Some(pos) = self.position(id) {
            self.entries.remove(pos);
        }
        Some(indexed)
    }

    fn drain(&mut self) -> Vec<Unsubscribe> {
        self.entries.clear();
        self.index.drain().map(|(_, indexed)| indexed.unsubscribe).collect()
    }
}

pub(crate) struct ArrayInner<S> {
    state: Mutex<ArrayState<S>>,
    subscribers: Subscribers<[Arc<S>]>,
    child_updates: Debouncer<PendingEntries>,
    /// Set while `set()` writes into existing entries.
    reconciling: AtomicBool,
    manual_update: bool,
    reducer: Option<DataReducer<S>>,
    entry_hook: Option<Arc<dyn EntryUpdateHook>>,
}

impl<S: EntryStore> ArrayInner<S> {
    fn snapshot(&self) -> Vec<Arc<S>> {
        lock(&self.state).entries.clone()
    }

    fn notify_all(&self) {
        let snapshot = self.snapshot();
        self.subscribers.notify(&snapshot[..]);
        if let Some(reducer) = &self.reducer {
            reducer.refresh(snapshot);
        }
    }

    fn finish_update(&self, notify: bool) {
        if notify {
            self.notify_all();
        } else if let Some(reducer) = &self.reducer {
            reducer.refresh(self.snapshot());
        }
    }

    fn subscribe_entry(self: &Arc<Self>, entry: &Arc<S>) -> Unsubscribe {
        let weak: Weak<Self> = Arc::downgrade(self);
        let primed = AtomicBool::new(false);
        entry.subscribe(move |data: &EntryData| {
            // Skip the push-on-subscribe call.
            if !primed.swap(true, Ordering::SeqCst) {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.queue_child_update(data);
            }
        })
    }

    fn queue_child_update(&self, data: &EntryData) {
        if self.reconciling.load(Ordering::SeqCst) {
            return;
        }
        let data = data.clone();
        self.child_updates.push(move |pending| pending.with_update(data));
    }

    fn flush_child_updates(&self, pending: PendingEntries) {
        let updates: Vec<EntryData> = {
            let state = lock(&self.state);
            pending
                .into_updates()
                .into_iter()
                .filter(|data| entry_id(data).is_some_and(|id| state.index.contains_key(id)))
                .collect()
        };
        if updates.is_empty() {
            return;
        }

        let decision = self
            .entry_hook
            .as_ref()
            .and_then(|hook| hook.entries_updated(updates));
        self.finish_update(decision.unwrap_or(!self.manual_update));
    }

    fn update_subscribers(&self, update: SubscriberUpdate) {
        let gate = !self.manual_update;
        let notify = match update {
            SubscriberUpdate::Default | SubscriberUpdate::Entry(_) => gate,
            SubscriberUpdate::Flag(flag) => flag || gate,
        };
        self.finish_update(notify);
    }

    /// Build and subscribe an entry without inserting it.
    fn build_entry(self: &Arc<Self>, mut data: EntryData) -> Result<(Arc<S>, Unsubscribe), StoreError> {
        let id = ensure_id(&mut data)?;
        if lock(&self.state).index.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }

        let entry = Arc::new(S::from_data(data)?);
        if !is_uuid_v4(entry.id()) {
            return Err(StoreError::InvalidId(entry.id().to_string()));
        }
        let unsubscribe = self.subscribe_entry(&entry);
        Ok((entry, unsubscribe))
    }

    fn insert_entry(&self, entry: Arc<S>, unsubscribe: Unsubscribe) -> Result<Arc<S>, StoreError> {
        let mut state = lock(&self.state);
        let id = entry.id().to_string();
        if state.index.contains_key(&id) {
            drop(state);
            unsubscribe.unsubscribe();
            return Err(StoreError::DuplicateId(id));
        }
        state.entries.push(Arc::clone(&entry));
        state.index.insert(
            id,
            IndexedEntry {
                entry: Arc::clone(&entry),
                unsubscribe,
            },
        );
        Ok(entry)
    }

    fn create_local(self: &Arc<Self>, data: EntryData) -> Result<Arc<S>, StoreError> {
        let (entry, unsubscribe) = self.build_entry(data)?;
        self.insert_entry(entry, unsubscribe)
    }

    fn create_entry(self: &Arc<Self>, data: EntryData) -> Result<Arc<S>, StoreError> {
        let entry = self.create_local(data)?;
        tracing::debug!(id = entry.id(), "entry created");
        self.notify_all();
        Ok(entry)
    }

    fn delete_entry(&self, id: &str) -> bool {
        let removed = lock(&self.state).remove(id);
        match removed {
            Some(indexed) => {
                indexed.unsubscribe.unsubscribe();
                tracing::debug!(id, "entry deleted");
                self.notify_all();
                true
            }
            None => false,
        }
    }

    fn duplicate_entry(self: &Arc<Self>, id: &str) -> Result<Option<Arc<S>>, StoreError> {
        let (source, siblings) = {
            let state = lock(&self.state);
            let source = state.index.get(id).map(|indexed| Arc::clone(&indexed.entry));
            (source, state.entries.clone())
        };
        let Some(source) = source else {
            return Ok(None);
        };

        let mut data = source.to_json();
        data.insert(ID_KEY.to_string(), Value::String(generate_id()));
        S::duplicate(&mut data, &siblings);
        self.create_entry(data).map(Some)
    }

    fn clear_entries(&self) {
        self.child_updates.cancel();
        let unsubscribes = lock(&self.state).drain();
        for unsubscribe in unsubscribes {
            unsubscribe.unsubscribe();
        }
        self.notify_all();
    }

    fn set(self: &Arc<Self>, update_list: Vec<EntryData>) {
        // Normalise ids first; first occurrence of a repeated id wins.
        let mut incoming: Vec<(String, EntryData)> = Vec::with_capacity(update_list.len());
        let mut seen = HashSet::new();
        for mut data in update_list {
            match ensure_id(&mut data) {
                Ok(id) if seen.insert(id.clone()) => incoming.push((id, data)),
                Ok(id) => tracing::warn!(id = %id, "set() received a repeated entry id; ignoring later copy"),
                Err(err) => tracing::warn!(error = %err, "set() skipping entry"),
            }
        }

        // Build entries that do not exist yet outside the state lock.
        let mut fresh: HashMap<String, (Arc<S>, Unsubscribe)> = HashMap::new();
        for (id, data) in &incoming {
            if lock(&self.state).index.contains_key(id) {
                continue;
            }
            match self.build_entry(data.clone()) {
                Ok(built) => {
                    fresh.insert(id.clone(), built);
                }
                Err(err) => tracing::warn!(id = %id, error = %err, "set() could not create entry"),
            }
        }

        let mut to_update: Vec<(Arc<S>, EntryData)> = Vec::new();
        let mut detached: Vec<Unsubscribe> = Vec::new();
        let mut rebuild = false;
        let mut changed = false;
        {
            let mut state = lock(&self.state);
            let mut position = 0;
            for (id, data) in &incoming {
                let entry = match state.index.get(id) {
                    Some(indexed) => {
                        let entry = Arc::clone(&indexed.entry);
                        to_update.push((Arc::clone(&entry), data.clone()));
                        entry
                    }
                    None => match fresh.remove(id) {
                        Some((entry, unsubscribe)) => {
                            changed = true;
                            state.index.insert(
                                id.clone(),
                                IndexedEntry {
                                    entry: Arc::clone(&entry),
                                    unsubscribe,
                                },
                            );
                            entry
                        }
                        None => continue,
                    },
                };

                let current = state.position(id);
                if current != Some(position) {
                    changed = true;
                    if let Some(current) = current {
                        state.entries.remove(current);
                    }
                    // Indices 0..position already hold earlier incoming ids,
                    // so this only trips if that invariant is broken.
                    if position > state.entries.len() {
                        rebuild = true;
                        break;
                    }
                    state.entries.insert(position, entry);
                }
                position += 1;
            }

            if rebuild {
                detached.extend(state.drain());
            } else {
                let stale: Vec<String> = state
                    .index
                    .keys()
                    .filter(|id| !seen.contains(*id))
                    .cloned()
                    .collect();
                for id in stale {
                    if let Some(indexed) = state.remove(&id) {
                        changed = true;
                        detached.push(indexed.unsubscribe);
                    }
                }
            }
        }

        detached.extend(fresh.into_values().map(|(_, unsubscribe)| unsubscribe));
        for unsubscribe in detached {
            unsubscribe.unsubscribe();
        }

        if rebuild {
            tracing::debug!("set() order could not be applied in place; rebuilding collection");
            for (_, data) in incoming {
                if let Err(err) = self.create_local(data) {
                    tracing::warn!(error = %err, "set() could not recreate entry");
                }
            }
        } else {
            self.reconciling.store(true, Ordering::SeqCst);
            for (entry, data) in to_update {
                if entry.to_json() != data {
                    changed = true;
                    entry.set(data);
                }
            }
            self.reconciling.store(false, Ordering::SeqCst);
        }

        if changed || rebuild {
            self.notify_all();
        }
    }
}

/// Reactive ordered collection of uniquely identified entries.
///
/// Structural changes (`create_entry`, `delete_entry`, `set`,
/// `clear_entries`) notify subscribers synchronously, once per call. Changes
/// made inside individual entries are coalesced for `child_debounce`
/// milliseconds on the [`Scheduler`] and then bubble up as a single update.
///
/// ```
/// use serde_json::json;
/// use tabletop_stores::{ArrayObjectStore, ArrayStoreOptions, EntryStore, Scheduler};
///
/// let scheduler = Scheduler::new();
/// let store: ArrayObjectStore =
///     ArrayObjectStore::new(&scheduler, ArrayStoreOptions::new()).unwrap();
///
/// let entry = store
///     .create_entry(json!({"name": "a"}).as_object().cloned().unwrap())
///     .unwrap();
/// assert_eq!(store.len(), 1);
/// assert!(store.get_entry(entry.id()).is_some());
/// ```
pub struct ArrayObjectStore<S = ObjectEntryStore> {
    inner: Arc<ArrayInner<S>>,
}

impl<S> Clone for ArrayObjectStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: EntryStore> ArrayObjectStore<S> {
    pub fn new(scheduler: &Scheduler, options: ArrayStoreOptions) -> Result<Self, StoreError> {
        Self::build(scheduler, options, None)
    }

    pub(crate) fn build(
        scheduler: &Scheduler,
        options: ArrayStoreOptions,
        entry_hook: Option<Arc<dyn EntryUpdateHook>>,
    ) -> Result<Self, StoreError> {
        options.validate()?;

        let ArrayStoreOptions {
            default_data,
            child_debounce,
            data_reducer,
            manual_update,
        } = options;

        let inner = Arc::new_cyclic(|weak: &Weak<ArrayInner<S>>| {
            let weak = weak.clone();
            ArrayInner {
                state: Mutex::new(ArrayState {
                    entries: Vec::new(),
                    index: HashMap::new(),
                }),
                subscribers: Subscribers::new(),
                child_updates: Debouncer::new(scheduler.clone(), child_debounce, move |pending| {
                    if let Some(inner) = weak.upgrade() {
                        inner.flush_child_updates(pending);
                    }
                }),
                reconciling: AtomicBool::new(false),
                manual_update,
                reducer: data_reducer.then(DataReducer::new),
                entry_hook,
            }
        });

        for data in default_data {
            inner.create_local(data)?;
        }
        if let Some(reducer) = &inner.reducer {
            reducer.refresh(inner.snapshot());
        }

        Ok(Self { inner })
    }

    /// Add a new entry. An `id` is generated when `data` has none.
    pub fn create_entry(&self, data: EntryData) -> Result<Arc<S>, StoreError> {
        self.inner.create_entry(data)
    }

    /// Remove an entry. Returns whether it existed.
    pub fn delete_entry(&self, id: &str) -> bool {
        self.inner.delete_entry(id)
    }

    /// Deep-copy an entry under a fresh id, running [`EntryStore::duplicate`].
    pub fn duplicate_entry(&self, id: &str) -> Result<Option<Arc<S>>, StoreError> {
        self.inner.duplicate_entry(id)
    }

    pub fn find_entry<P>(&self, predicate: P) -> Option<Arc<S>>
    where
        P: Fn(&S) -> bool,
    {
        lock(&self.inner.state)
            .entries
            .iter()
            .find(|entry| predicate(&***entry))
            .cloned()
    }

    pub fn get_entry(&self, id: &str) -> Option<Arc<S>> {
        lock(&self.inner.state)
            .index
            .get(id)
            .map(|indexed| Arc::clone(&indexed.entry))
    }

    /// Reconcile the collection with `update_list`.
    ///
    /// Existing entries are updated in place and moved to their new index,
    /// missing ones are created, and entries absent from the list are
    /// removed. Subscribers are notified once, and not at all when the list
    /// matches the collection already.
    pub fn set(&self, update_list: Vec<EntryData>) {
        self.inner.set(update_list);
    }

    /// [`set`](Self::set) for untrusted JSON. Anything but an array is
    /// logged and ignored; non-object items are skipped.
    pub fn set_value(&self, value: &Value) {
        let Value::Array(items) = value else {
            tracing::warn!(received = %value, "set() expects an array of entries; ignoring update");
            return;
        };

        let list = items
            .iter()
            .filter_map(|item| match item {
                Value::Object(data) => Some(data.clone()),
                other => {
                    tracing::warn!(item = %other, "set() skipping non-object entry");
                    None
                }
            })
            .collect();
        self.inner.set(list);
    }

    pub fn clear_entries(&self) {
        self.inner.clear_entries();
    }

    /// Fan out to subscribers, subject to the manual-update gate. The data
    /// reducer view is refreshed regardless of the gate.
    pub fn update_subscribers(&self, update: SubscriberUpdate) {
        self.inner.update_subscribers(update);
    }

    /// Notify subscribers, or only refresh the data reducer when `notify`
    /// is false.
    pub(crate) fn finish_update(&self, notify: bool) {
        self.inner.finish_update(notify);
    }

    /// Entries in collection order.
    pub fn entries(&self) -> Vec<Arc<S>> {
        self.inner.snapshot()
    }

    pub fn ids(&self) -> Vec<String> {
        lock(&self.inner.state)
            .entries
            .iter()
            .map(|entry| entry.id().to_string())
            .collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Arc<S>> {
        self.entries().into_iter()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON array of every entry's data.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.entries()
                .iter()
                .map(|entry| Value::Object(entry.to_json()))
                .collect(),
        )
    }

    pub fn data_reducer(&self) -> Option<&DataReducer<S>> {
        self.inner.reducer.as_ref()
    }

    pub fn manual_update(&self) -> bool {
        self.inner.manual_update
    }

    /// Whether entry changes are waiting for the child debounce to elapse.
    pub fn has_pending_child_updates(&self) -> bool {
        self.inner.child_updates.is_pending()
    }
}

impl<S: EntryStore> Readable<[Arc<S>]> for ArrayObjectStore<S> {
    fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&[Arc<S>]) + Send + Sync + 'static,
    {
        let snapshot = self.inner.snapshot();
        handler(&snapshot[..]);
        self.inner.subscribers.add(handler)
    }
}

impl<'a, S: EntryStore> IntoIterator for &'a ArrayObjectStore<S> {
    type Item = Arc<S>;
    type IntoIter = std::vec::IntoIter<Arc<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: EntryStore> fmt::Debug for ArrayObjectStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayObjectStore")
            .field("ids", &self.ids())
            .field("manual_update", &self.inner.manual_update)
            .field("child_updates", &self.inner.child_updates)
            .field("subscribers", &self.inner.subscribers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> EntryData {
        value.as_object().cloned().unwrap()
    }

    fn store(scheduler: &Scheduler, options: ArrayStoreOptions) -> ArrayObjectStore {
        ArrayObjectStore::new(scheduler, options).unwrap()
    }

    #[test]
    fn pending_entries_keep_latest_per_id() {
        let id = generate_id();
        let pending = PendingEntries::default()
            .with_update(data(json!({"id": id, "n": 1})))
            .with_update(data(json!({"id": generate_id(), "n": 2})))
            .with_update(data(json!({"id": id, "n": 3})));

        let updates = pending.into_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0]["n"], json!(3));
    }

    #[test]
    fn default_data_is_loaded_without_notification_queue() {
        let scheduler = Scheduler::new();
        let store = store(
            &scheduler,
            ArrayStoreOptions::new()
                .with_default_data(vec![data(json!({"name": "a"})), data(json!({"name": "b"}))]),
        );
        assert_eq!(store.len(), 2);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn duplicate_default_ids_fail_construction() {
        let scheduler = Scheduler::new();
        let id = generate_id();
        let result: Result<ArrayObjectStore, _> = ArrayObjectStore::new(
            &scheduler,
            ArrayStoreOptions::new()
                .with_default_data(vec![data(json!({"id": id})), data(json!({"id": id}))]),
        );
        assert_eq!(result.unwrap_err(), StoreError::DuplicateId(id));
    }

    #[test]
    fn delete_missing_entry_does_not_notify() {
        let scheduler = Scheduler::new();
        let store = store(&scheduler, ArrayStoreOptions::new());
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let _unsub = store.subscribe(move |_| *counter.lock().unwrap() += 1);

        assert!(!store.delete_entry(&generate_id()));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn deleted_entries_are_unsubscribed() {
        let scheduler = Scheduler::new();
        let store = store(&scheduler, ArrayStoreOptions::new());
        let entry = store.create_entry(data(json!({}))).unwrap();
        assert_eq!(entry.subscriber_count(), 1);

        store.delete_entry(entry.id());
        assert_eq!(entry.subscriber_count(), 0);
    }

    #[test]
    fn child_updates_for_deleted_entries_are_dropped() {
        let scheduler = Scheduler::new();
        let store = store(&scheduler, ArrayStoreOptions::new().with_child_debounce(0));
        let entry = store.create_entry(data(json!({"n": 1}))).unwrap();
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let _unsub = store.subscribe(move |_| *counter.lock().unwrap() += 1);

        entry.update(|d| {
            d.insert("n".into(), json!(2));
        });
        store.delete_entry(entry.id());
        scheduler.flush();

        // Subscribe push plus the delete.
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn to_json_lists_entries_in_order() {
        let scheduler = Scheduler::new();
        let store = store(&scheduler, ArrayStoreOptions::new());
        store.create_entry(data(json!({"name": "a"}))).unwrap();
        store.create_entry(data(json!({"name": "b"}))).unwrap();

        let names: Vec<_> = store.to_json().as_array().unwrap().iter().map(|v| v["name"].clone()).collect();
        assert_eq!(names, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn reordering_with_new_ids_keeps_existing_entries_in_place() {
        let scheduler = Scheduler::new();
        let store = store(&scheduler, ArrayStoreOptions::new());
        let a = store.create_entry(data(json!({"name": "a"}))).unwrap();
        let b = store.create_entry(data(json!({"name": "b"}))).unwrap();
        let c = store.create_entry(data(json!({"name": "c"}))).unwrap();
        let fresh = generate_id();

        store.set(vec![
            c.to_json(),
            data(json!({"id": fresh, "name": "new"})),
            a.to_json(),
            b.to_json(),
        ]);
        assert_eq!(
            store.ids(),
            vec![c.id().to_string(), fresh.clone(), a.id().to_string(), b.id().to_string()]
        );

        store.set(vec![b.to_json(), a.to_json()]);
        assert_eq!(store.ids(), vec![b.id().to_string(), a.id().to_string()]);

        // No rebuild: the original stores survive every reorder.
        assert!(Arc::ptr_eq(&store.get_entry(a.id()).unwrap(), &a));
        assert!(Arc::ptr_eq(&store.get_entry(b.id()).unwrap(), &b));
        assert_eq!(a.subscriber_count(), 1);
        assert_eq!(c.subscriber_count(), 0);
    }
}
