//! Session state aggregate
//!
//! One value owns the address collection, the dimension cache and the UI
//! phase. Navigation, projection and submission all take it by reference.

use crate::collection::AddressCollection;
use crate::dimensions::{dimension_key, DimensionCache};
use crate::form::{self, FormFields};
use shipform_common::UiPhase;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub addresses: AddressCollection,
    pub dimensions: DimensionCache,
    pub phase: UiPhase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            addresses: AddressCollection::new(),
            dimensions: DimensionCache::new(),
            phase: UiPhase::Input,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.addresses.cursor()
    }

    /// Dimension key of the record at the cursor
    pub fn current_key(&self) -> Option<String> {
        self.addresses
            .current()
            .map(|record| dimension_key(record, self.addresses.cursor()))
    }

    /// Store the form's dimension fields under the current record's key
    ///
    /// No-op when the collection is empty.
    pub fn save_current_dimensions(&mut self, form: &FormFields) {
        if let Some(key) = self.current_key() {
            self.dimensions.save(key, form::capture_dimensions(form));
        }
    }

    /// Project the current record, plus its cached dimensions, onto the form
    ///
    /// Also restamps the current-address flags. Returns false when there is
    /// nothing to project.
    pub fn load_current(&mut self, form: &mut FormFields) -> bool {
        self.addresses.mark_current();
        let Some(key) = self.current_key() else {
            return false;
        };
        let Some(record) = self.addresses.current() else {
            return false;
        };
        form::project(record, self.dimensions.load(&key), form);
        true
    }

    /// Drop all addresses and cached dimensions, back to the input phase
    pub fn reset(&mut self) {
        self.addresses.clear();
        self.dimensions.clear();
        self.phase = UiPhase::Input;
    }
}
