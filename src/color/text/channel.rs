use std::fmt;

use crate::error::StoreError;
use crate::store::{Readable, SettableStore, Unsubscribe, WritableStore};

/// Read text typed into a numeric field. Blank input means "no value".
pub fn parse_input(input: &str) -> Result<Option<f64>, StoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| StoreError::NotNumeric(input.to_string()))
}

/// One editable, clamped numeric field of a format view.
///
/// `None` is a transient state: user edits write `None` before the final
/// value so an unchanged value still reaches subscribers.
#[derive(Clone)]
pub struct NumericChannel {
    store: WritableStore<Option<f64>>,
    min: f64,
    max: f64,
    fallback: f64,
}

impl NumericChannel {
    pub(crate) fn new(min: f64, max: f64, fallback: f64) -> Self {
        Self {
            store: WritableStore::new(Some(fallback)),
            min,
            max,
            fallback,
        }
    }

    /// Raw stored value.
    pub fn get(&self) -> Option<f64> {
        self.store.get()
    }

    /// Stored value, or the fallback while unset.
    pub fn value(&self) -> f64 {
        self.store.get().unwrap_or(self.fallback)
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Missing and NaN values become the fallback; everything else is clamped.
    pub fn coerce(&self, value: Option<f64>) -> f64 {
        match value {
            Some(v) if !v.is_nan() => v.clamp(self.min, self.max),
            _ => self.fallback,
        }
    }

    pub(crate) fn commit(&self, value: Option<f64>) -> f64 {
        let value = self.coerce(value);
        self.store.set(None);
        self.store.set(Some(value));
        value
    }

    pub(crate) fn show(&self, value: f64) {
        self.store.set(Some(value));
    }
}

impl Readable<Option<f64>> for NumericChannel {
    fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&Option<f64>) + Send + Sync + 'static,
    {
        self.store.subscribe(handler)
    }
}

impl fmt::Debug for NumericChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericChannel")
            .field("value", &self.store.get())
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}
