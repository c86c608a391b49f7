//! Per-order package dimension cache
//!
//! Keyed by order id, or by the record's position when the order id is
//! missing. The positional fallback tracks the slot rather than the order,
//! so the cache must be fully cleared whenever the collection is replaced.

use shipform_common::{AddressRecord, DimensionRecord};
use std::collections::HashMap;

/// Cache key for `record` sitting at `index`
pub fn dimension_key(record: &AddressRecord, index: usize) -> String {
    match record.order_id() {
        Some(order_id) => order_id.to_string(),
        None => index.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct DimensionCache {
    entries: HashMap<String, DimensionRecord>,
}

impl DimensionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional overwrite
    pub fn save(&mut self, key: impl Into<String>, dimensions: DimensionRecord) {
        self.entries.insert(key.into(), dimensions);
    }

    pub fn load(&self, key: &str) -> Option<&DimensionRecord> {
        self.entries.get(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
