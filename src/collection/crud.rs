use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::array_store::{ArrayObjectStore, EntryUpdateHook, SubscriberUpdate};
use super::options::ArrayStoreOptions;
use super::reducer::DataReducer;
use crate::entry::{entry_id, is_uuid_v4, EntryData, EntryStore, ObjectEntryStore};
use crate::error::StoreError;
use crate::scheduler::Scheduler;
use crate::store::{Readable, Unsubscribe};

/// What happened to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudAction {
    Create,
    Update,
    Delete,
    Clear,
}

/// Intent sent to the external persistence service.
///
/// Serialises as `{action, id?, data?, ...extraData}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrudIntent {
    pub action: CrudAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EntryData>,
    #[serde(flatten)]
    pub extra: EntryData,
}

impl CrudIntent {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Callback receiving every intent. `Some(bool)` overrides whether an
/// entry-level update notifies local subscribers; `None` keeps the default.
pub type CrudDispatch = Arc<dyn Fn(&CrudIntent) -> Option<bool> + Send + Sync>;

struct CrudDispatcher {
    dispatch: CrudDispatch,
    extra_data: EntryData,
}

impl CrudDispatcher {
    fn dispatch(
        &self,
        action: CrudAction,
        id: Option<String>,
        data: Option<EntryData>,
    ) -> Option<bool> {
        let intent = CrudIntent {
            action,
            id,
            data,
            extra: self.extra_data.clone(),
        };
        tracing::debug!(action = ?intent.action, id = ?intent.id, "crud dispatch");
        (self.dispatch)(&intent)
    }
}

impl EntryUpdateHook for CrudDispatcher {
    /// One `update` intent per entry. Any `true` reply notifies; otherwise
    /// any `false` reply suppresses.
    fn entries_updated(&self, updates: Vec<EntryData>) -> Option<bool> {
        let mut decision = None;
        for data in updates {
            let id = entry_id(&data).map(str::to_string);
            match self.dispatch(CrudAction::Update, id, Some(data)) {
                Some(true) => decision = Some(true),
                Some(false) => {
                    decision.get_or_insert(false);
                }
                None => {}
            }
        }
        decision
    }
}

/// Options for [`CrudArrayObjectStore`].
#[derive(Clone, Default)]
pub struct CrudStoreOptions {
    pub base: ArrayStoreOptions,
    pub dispatch: Option<CrudDispatch>,
    /// Merged into every dispatched intent.
    pub extra_data: EntryData,
    /// Overrides the manual-update default (`true` when a dispatch is set).
    pub manual_update: Option<bool>,
}

impl CrudStoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, base: ArrayStoreOptions) -> Self {
        self.base = base;
        self
    }

    pub fn with_dispatch<F>(mut self, dispatch: F) -> Self
    where
        F: Fn(&CrudIntent) -> Option<bool> + Send + Sync + 'static,
    {
        self.dispatch = Some(Arc::new(dispatch));
        self
    }

    pub fn with_extra_data(mut self, extra: EntryData) -> Self {
        self.extra_data = extra;
        self
    }

    pub fn with_manual_update(mut self, enabled: bool) -> Self {
        self.manual_update = Some(enabled);
        self
    }
}

impl fmt::Debug for CrudStoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudStoreOptions")
            .field("base", &self.base)
            .field("dispatch", &self.dispatch.is_some())
            .field("extra_data", &self.extra_data)
            .field("manual_update", &self.manual_update)
            .finish()
    }
}

/// [`ArrayObjectStore`] that reports every local change to an external
/// persistence service.
///
/// Local operations always complete before the dispatch runs and are never
/// rolled back. Entry-level changes become `update` intents whose return
/// value decides whether local subscribers hear about them.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use serde_json::json;
/// use tabletop_stores::{CrudAction, CrudArrayObjectStore, CrudStoreOptions, Scheduler};
///
/// let scheduler = Scheduler::new();
/// let actions = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&actions);
/// let store: CrudArrayObjectStore = CrudArrayObjectStore::new(
///     &scheduler,
///     CrudStoreOptions::new().with_dispatch(move |intent| {
///         sink.lock().unwrap().push(intent.action);
///         None
///     }),
/// )
/// .unwrap();
///
/// store.create_entry(json!({"name": "a"}).as_object().cloned().unwrap()).unwrap();
/// store.clear_entries();
/// assert_eq!(*actions.lock().unwrap(), vec![CrudAction::Create, CrudAction::Clear]);
/// ```
pub struct CrudArrayObjectStore<S = ObjectEntryStore> {
    store: ArrayObjectStore<S>,
    dispatcher: Option<Arc<CrudDispatcher>>,
}

impl<S> Clone for CrudArrayObjectStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<S: EntryStore> CrudArrayObjectStore<S> {
    pub fn new(scheduler: &Scheduler, options: CrudStoreOptions) -> Result<Self, StoreError> {
        let CrudStoreOptions {
            mut base,
            dispatch,
            extra_data,
            manual_update,
        } = options;

        base.manual_update = manual_update.unwrap_or(dispatch.is_some() || base.manual_update);
        let dispatcher = dispatch.map(|dispatch| {
            Arc::new(CrudDispatcher {
                dispatch,
                extra_data,
            })
        });
        let hook = dispatcher
            .clone()
            .map(|dispatcher| dispatcher as Arc<dyn EntryUpdateHook>);

        Ok(Self {
            store: ArrayObjectStore::build(scheduler, base, hook)?,
            dispatcher,
        })
    }

    fn dispatch(&self, action: CrudAction, id: Option<String>, data: Option<EntryData>) -> Option<bool> {
        self.dispatcher
            .as_ref()
            .and_then(|dispatcher| dispatcher.dispatch(action, id, data))
    }

    fn dispatch_created(&self, entry: &S) {
        self.dispatch(
            CrudAction::Create,
            Some(entry.id().to_string()),
            Some(entry.to_json()),
        );
    }

    /// Create locally, notify, then dispatch `create`.
    pub fn create_entry(&self, data: EntryData) -> Result<Arc<S>, StoreError> {
        let entry = self.store.create_entry(data)?;
        self.dispatch_created(&entry);
        Ok(entry)
    }

    /// Delete locally, notify, then dispatch `delete` when something was removed.
    pub fn delete_entry(&self, id: &str) -> bool {
        let removed = self.store.delete_entry(id);
        if removed {
            self.dispatch(CrudAction::Delete, Some(id.to_string()), None);
        }
        removed
    }

    /// The copy is dispatched as `create`.
    pub fn duplicate_entry(&self, id: &str) -> Result<Option<Arc<S>>, StoreError> {
        let copy = self.store.duplicate_entry(id)?;
        if let Some(entry) = &copy {
            self.dispatch_created(entry);
        }
        Ok(copy)
    }

    /// Clear locally, notify, then dispatch `clear`.
    pub fn clear_entries(&self) {
        self.store.clear_entries();
        self.dispatch(CrudAction::Clear, None, None);
    }

    /// Apply authoritative data from the persistence service. Nothing is
    /// dispatched.
    pub fn set(&self, update_list: Vec<EntryData>) {
        self.store.set(update_list);
    }

    pub fn set_value(&self, value: &Value) {
        self.store.set_value(value);
    }

    /// An [`SubscriberUpdate::Entry`] carrying a UUIDv4 id is dispatched as
    /// `update`; the dispatch result decides whether subscribers run.
    pub fn update_subscribers(&self, update: SubscriberUpdate) {
        if let SubscriberUpdate::Entry(data) = &update {
            let id = entry_id(data).filter(|id| is_uuid_v4(id));
            if let (Some(id), Some(dispatcher)) = (id, &self.dispatcher) {
                let notify = dispatcher
                    .dispatch(CrudAction::Update, Some(id.to_string()), Some(data.clone()))
                    .unwrap_or(!self.store.manual_update());
                self.store.finish_update(notify);
                return;
            }
        }
        self.store.update_subscribers(update);
    }

    pub fn find_entry<P>(&self, predicate: P) -> Option<Arc<S>>
    where
        P: Fn(&S) -> bool,
    {
        self.store.find_entry(predicate)
    }

    pub fn get_entry(&self, id: &str) -> Option<Arc<S>> {
        self.store.get_entry(id)
    }

    pub fn entries(&self) -> Vec<Arc<S>> {
        self.store.entries()
    }

    pub fn ids(&self) -> Vec<String> {
        self.store.ids()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Arc<S>> {
        self.store.iter()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn to_json(&self) -> Value {
        self.store.to_json()
    }

    pub fn data_reducer(&self) -> Option<&DataReducer<S>> {
        self.store.data_reducer()
    }

    pub fn manual_update(&self) -> bool {
        self.store.manual_update()
    }

    /// The undecorated collection.
    pub fn store(&self) -> &ArrayObjectStore<S> {
        &self.store
    }
}

impl<S: EntryStore> Readable<[Arc<S>]> for CrudArrayObjectStore<S> {
    fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&[Arc<S>]) + Send + Sync + 'static,
    {
        self.store.subscribe(handler)
    }
}

impl<'a, S: EntryStore> IntoIterator for &'a CrudArrayObjectStore<S> {
    type Item = Arc<S>;
    type IntoIter = std::vec::IntoIter<Arc<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: EntryStore> fmt::Debug for CrudArrayObjectStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudArrayObjectStore")
            .field("store", &self.store)
            .field("dispatch", &self.dispatcher.is_some())
            .finish()
    }
}
