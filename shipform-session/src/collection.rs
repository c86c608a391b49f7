//! Address collection with a selection cursor
//!
//! Holds the extracted records in order plus the index of the record the
//! user is looking at. Whenever the collection is non-empty exactly one
//! record carries `current_address = true`, and it is the one at the cursor.

use shipform_common::AddressRecord;

#[derive(Debug, Clone, Default)]
pub struct AddressCollection {
    records: Vec<AddressRecord>,
    cursor: usize,
}

impl AddressCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every record, put the cursor on the first one and restamp flags
    pub fn replace_all(&mut self, records: Vec<AddressRecord>) {
        self.records = records;
        self.cursor = 0;
        self.mark_current();
    }

    /// Drop every record and rewind the cursor
    pub fn clear(&mut self) {
        self.records.clear();
        self.cursor = 0;
    }

    /// Move the cursor; out-of-range indices are refused
    pub fn set_cursor(&mut self, index: usize) -> bool {
        if index >= self.records.len() {
            return false;
        }
        self.cursor = index;
        self.mark_current();
        true
    }

    /// Sole mutator of `current_address`: true at the cursor, false elsewhere
    pub fn mark_current(&mut self) {
        let cursor = self.cursor;
        for (index, record) in self.records.iter_mut().enumerate() {
            record.current_address = index == cursor;
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// More than one record, so previous/next mean something
    pub fn is_navigable(&self) -> bool {
        self.records.len() > 1
    }

    /// Record at the cursor
    pub fn current(&self) -> Option<&AddressRecord> {
        self.records.get(self.cursor)
    }

    pub fn get(&self, index: usize) -> Option<&AddressRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[AddressRecord] {
        &self.records
    }
}
