//! Test domain: a folder entry whose copies get numbered names.

use std::sync::Arc;

use serde_json::Value;
use tabletop_stores::{EntryData, EntryStore, ObjectEntryStore};

#[derive(Debug, EntryStore)]
#[entry_store(duplicate = "number_copy")]
pub struct FolderEntry(pub ObjectEntryStore);

impl FolderEntry {
    pub fn name(&self) -> Option<String> {
        self.0.get("name").and_then(|v| v.as_str().map(str::to_string))
    }
}

/// "Maps" becomes "Maps (1)", then "Maps (2)" while earlier copies exist.
pub fn number_copy(data: &mut EntryData, siblings: &[Arc<FolderEntry>]) {
    let base = data
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Folder")
        .to_string();

    let mut n = 1;
    loop {
        let candidate = format!("{} ({})", base, n);
        if !siblings
            .iter()
            .any(|sibling| sibling.name().as_deref() == Some(candidate.as_str()))
        {
            data.insert("name".into(), Value::String(candidate));
            return;
        }
        n += 1;
    }
}

/// Entry with named fields; only `store` is backed by data.
#[derive(EntryStore)]
#[entry_store(inner = "store")]
pub struct TaggedEntry {
    pub tag: Option<String>,
    pub store: ObjectEntryStore,
}

impl TaggedEntry {
    pub fn label(&self) -> Option<Value> {
        self.store.get("label")
    }
}
