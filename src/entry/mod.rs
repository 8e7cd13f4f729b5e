//! Entries - uniquely identified JSON objects held by collections.
//!
//! A collection is generic over its entry type through the [`EntryStore`]
//! trait. [`ObjectEntryStore`] is the stock implementation; wrap it in a
//! newtype and `#[derive(EntryStore)]` to customise duplication:
//!
//! ```ignore
//! use std::sync::Arc;
//! use tabletop_stores::{EntryData, EntryStore, ObjectEntryStore};
//!
//! #[derive(EntryStore)]
//! #[entry_store(duplicate = "rename_copy")]
//! struct FolderEntry(ObjectEntryStore);
//!
//! fn rename_copy(data: &mut EntryData, _siblings: &[Arc<FolderEntry>]) {
//!     // ...
//! }
//! ```

mod object_entry;

use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::Readable;

pub use object_entry::ObjectEntryStore;

/// Raw entry payload: a JSON object with an `id` key.
pub type EntryData = Map<String, Value>;

/// Key holding an entry's identifier.
pub const ID_KEY: &str = "id";

/// A reactive store for one collection entry.
pub trait EntryStore: Readable<EntryData> + Send + Sync + Sized + 'static {
    /// Build an entry from data whose `id` is already a valid UUIDv4.
    fn from_data(data: EntryData) -> Result<Self, StoreError>;

    /// Immutable identifier.
    fn id(&self) -> &str;

    /// Replace the entry data. The id never changes.
    fn set(&self, data: EntryData);

    /// Copy of the current data.
    fn to_json(&self) -> EntryData;

    /// Hook run on a deep copy before it is added as a duplicate. `data`
    /// already carries a fresh id; `siblings` are the current entries.
    fn duplicate(_data: &mut EntryData, _siblings: &[Arc<Self>]) {}
}

/// Generate a new random UUIDv4 string.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Whether `id` is a hyphenated UUID with version 4 and the RFC 4122 variant.
pub fn is_uuid_v4(id: &str) -> bool {
    if id.len() != 36 {
        return false;
    }
    match Uuid::try_parse(id) {
        Ok(uuid) => uuid.get_version_num() == 4 && uuid.get_variant() == uuid::Variant::RFC4122,
        Err(_) => false,
    }
}

/// Read the `id` of an entry payload, if it is a string.
pub fn entry_id(data: &EntryData) -> Option<&str> {
    data.get(ID_KEY).and_then(Value::as_str)
}

/// Insert a fresh id when `data` has none.
///
/// Fails when an `id` is present but is not a UUIDv4 string.
pub fn ensure_id(data: &mut EntryData) -> Result<String, StoreError> {
    match data.get(ID_KEY) {
        None | Some(Value::Null) => {
            let id = generate_id();
            data.insert(ID_KEY.to_string(), Value::String(id.clone()));
            Ok(id)
        }
        Some(Value::String(id)) if is_uuid_v4(id) => Ok(id.clone()),
        Some(other) => Err(StoreError::InvalidId(match other {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        })),
    }
}
