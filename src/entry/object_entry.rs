use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::{ensure_id, EntryData, EntryStore, ID_KEY};
use crate::error::StoreError;
use crate::store::{lock, Readable, Subscribers, Unsubscribe};

/// Reactive wrapper around one JSON object with an immutable UUIDv4 `id`.
#[derive(Clone)]
pub struct ObjectEntryStore {
    id: Arc<str>,
    data: Arc<Mutex<EntryData>>,
    subscribers: Subscribers<EntryData>,
}

impl ObjectEntryStore {
    /// Wrap `data`, generating an id when it has none.
    pub fn new(mut data: EntryData) -> Result<Self, StoreError> {
        let id = ensure_id(&mut data)?;
        Ok(Self {
            id: Arc::from(id),
            data: Arc::new(Mutex::new(data)),
            subscribers: Subscribers::new(),
        })
    }

    /// Mutate the data in place, then notify subscribers.
    ///
    /// Any change to `id` made by `f` is reverted.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut EntryData),
    {
        {
            let mut data = lock(&self.data);
            f(&mut data);
            data.insert(ID_KEY.to_string(), Value::String(self.id.to_string()));
        }
        self.update_subscribers();
    }

    /// Push the current data to every subscriber.
    pub fn update_subscribers(&self) {
        let snapshot = lock(&self.data).clone();
        self.subscribers.notify(&snapshot);
    }

    /// Read one field.
    pub fn get(&self, key: &str) -> Option<Value> {
        lock(&self.data).get(key).cloned()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Readable<EntryData> for ObjectEntryStore {
    fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&EntryData) + Send + Sync + 'static,
    {
        let snapshot = lock(&self.data).clone();
        handler(&snapshot);
        self.subscribers.add(handler)
    }
}

impl EntryStore for ObjectEntryStore {
    fn from_data(data: EntryData) -> Result<Self, StoreError> {
        Self::new(data)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set(&self, mut data: EntryData) {
        if let Some(incoming) = data.get(ID_KEY).and_then(Value::as_str) {
            if incoming != &*self.id {
                tracing::warn!(id = %self.id, incoming, "ignoring attempt to change entry id");
            }
        }
        data.insert(ID_KEY.to_string(), Value::String(self.id.to_string()));

        {
            let mut current = lock(&self.data);
            if *current == data {
                return;
            }
            *current = data;
        }
        self.update_subscribers();
    }

    fn to_json(&self) -> EntryData {
        lock(&self.data).clone()
    }
}

impl fmt::Debug for ObjectEntryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectEntryStore")
            .field("id", &self.id)
            .field("data", &*lock(&self.data))
            .finish()
    }
}
