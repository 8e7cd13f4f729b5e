use serde::Deserialize;
use serde_json::Value;

use crate::entry::EntryData;
use crate::error::StoreError;

/// Default debounce applied to entry-level changes, in milliseconds.
pub const DEFAULT_CHILD_DEBOUNCE: u64 = 250;

/// Largest accepted child debounce, in milliseconds.
pub const MAX_CHILD_DEBOUNCE: u64 = 1000;

/// Options for [`ArrayObjectStore`](super::ArrayObjectStore).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ArrayStoreOptions {
    /// Entries created at construction time.
    pub default_data: Vec<EntryData>,
    /// Delay before entry changes bubble to collection subscribers.
    pub child_debounce: u64,
    /// Build a filtered/sorted [`DataReducer`](super::DataReducer) view.
    pub data_reducer: bool,
    /// Only notify on entry changes when asked explicitly.
    pub manual_update: bool,
}

impl Default for ArrayStoreOptions {
    fn default() -> Self {
        Self {
            default_data: Vec::new(),
            child_debounce: DEFAULT_CHILD_DEBOUNCE,
            data_reducer: false,
            manual_update: false,
        }
    }
}

impl ArrayStoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_data(mut self, data: Vec<EntryData>) -> Self {
        self.default_data = data;
        self
    }

    pub fn with_child_debounce(mut self, ms: u64) -> Self {
        self.child_debounce = ms;
        self
    }

    pub fn with_data_reducer(mut self, enabled: bool) -> Self {
        self.data_reducer = enabled;
        self
    }

    pub fn with_manual_update(mut self, enabled: bool) -> Self {
        self.manual_update = enabled;
        self
    }

    /// Parse host-supplied options (camelCase keys) and validate them.
    pub fn from_json(value: &Value) -> Result<Self, StoreError> {
        let options = Self::deserialize(value).map_err(|e| StoreError::InvalidOption {
            option: "options",
            reason: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.child_debounce > MAX_CHILD_DEBOUNCE {
            return Err(StoreError::InvalidOption {
                option: "childDebounce",
                reason: format!(
                    "expected an integer between 0 and {}, got {}",
                    MAX_CHILD_DEBOUNCE, self.child_debounce
                ),
            });
        }
        Ok(())
    }
}
