//! Shared helpers for the integration tests.
#![allow(dead_code)]

pub mod folder;
pub mod recorder;

use serde_json::Value;
use tabletop_stores::EntryData;

/// Object literal to entry data. Panics on anything but a JSON object.
pub fn data(value: Value) -> EntryData {
    value
        .as_object()
        .cloned()
        .unwrap_or_else(|| panic!("expected a JSON object, got {}", value))
}

/// Value of `key` in every entry, in order.
pub fn field(json: &Value, key: &str) -> Vec<Value> {
    json.as_array()
        .map(|items| items.iter().map(|item| item[key].clone()).collect())
        .unwrap_or_default()
}
