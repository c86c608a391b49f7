//! Wire data model shared between the session controller and its collaborators
//!
//! Field names on the wire follow the extraction server's capitalization
//! scheme (`ToName`, `Street1To`, ..., `order_id`), so every record field
//! carries an explicit serde rename.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One extracted shipping target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(rename = "ToName", default, skip_serializing_if = "Option::is_none")]
    pub to_name: Option<String>,

    #[serde(rename = "PhoneTo", default, skip_serializing_if = "Option::is_none")]
    pub phone_to: Option<String>,

    #[serde(rename = "Street1To", default, skip_serializing_if = "Option::is_none")]
    pub street1_to: Option<String>,

    #[serde(rename = "CompanyTo", default, skip_serializing_if = "Option::is_none")]
    pub company_to: Option<String>,

    #[serde(rename = "Street2To", default, skip_serializing_if = "Option::is_none")]
    pub street2_to: Option<String>,

    #[serde(rename = "CityTo", default, skip_serializing_if = "Option::is_none")]
    pub city_to: Option<String>,

    #[serde(rename = "StateTo", default, skip_serializing_if = "Option::is_none")]
    pub state_to: Option<String>,

    #[serde(rename = "ZipTo", default, skip_serializing_if = "Option::is_none")]
    pub zip_to: Option<String>,

    /// Order identifier; absent or empty means the record is identified by position
    #[serde(rename = "order_id", default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Derived selection flag, serialized as `"true"` / `"false"`
    #[serde(rename = "current_address", default, with = "flag_string")]
    pub current_address: bool,
}

impl AddressRecord {
    /// Order id if present and non-empty
    pub fn order_id(&self) -> Option<&str> {
        self.order_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Package metadata for one order
///
/// Values are free-form strings; no numeric coercion happens anywhere in the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRecord {
    pub weight: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub description: String,
}

/// Section of the UI that is currently active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiPhase {
    /// Markup input is shown
    Input,
    /// An extraction request is in flight
    Loading,
    /// Extraction failed; input is shown again along with the message
    Error,
    /// Shipping form is shown
    Form,
}

impl UiPhase {
    /// Whether the markup input section is visible in this phase
    pub fn shows_input(self) -> bool {
        matches!(self, UiPhase::Input | UiPhase::Error)
    }
}

impl fmt::Display for UiPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UiPhase::Input => "input",
            UiPhase::Loading => "loading",
            UiPhase::Error => "error",
            UiPhase::Form => "form",
        };
        f.write_str(name)
    }
}

/// Successful extraction result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// `multiple = false`: exactly one record
    Single(AddressRecord),
    /// `multiple = true`: ordered, non-empty sequence of records
    Multiple(Vec<AddressRecord>),
}

impl Extraction {
    pub fn is_multiple(&self) -> bool {
        matches!(self, Extraction::Multiple(_))
    }

    /// Flatten into an ordered sequence of records
    pub fn into_records(self) -> Vec<AddressRecord> {
        match self {
            Extraction::Single(record) => vec![record],
            Extraction::Multiple(records) => records,
        }
    }
}

/// Raw `POST /extract` response body
///
/// Success: `{"success": true, "multiple": bool, "data": ...}`.
/// Failure: `{"error": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub multiple: Option<bool>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExtractResponse {
    /// Interpret a success body, checking it has the expected shape
    ///
    /// Only a literal `multiple: true` selects multi-address handling.
    pub fn into_extraction(self) -> Result<Extraction> {
        let data = self
            .data
            .ok_or_else(|| Error::Protocol("extraction response has no data".to_string()))?;

        if self.multiple == Some(true) {
            if !data.is_array() {
                return Err(Error::Protocol(
                    "multiple extraction response data is not an array".to_string(),
                ));
            }
            let records: Vec<AddressRecord> = serde_json::from_value(data)
                .map_err(|e| Error::Protocol(format!("invalid address list: {}", e)))?;
            if records.is_empty() {
                return Err(Error::Protocol(
                    "multiple extraction response contains no addresses".to_string(),
                ));
            }
            Ok(Extraction::Multiple(records))
        } else {
            if !data.is_object() {
                return Err(Error::Protocol(
                    "single extraction response data is not an object".to_string(),
                ));
            }
            let record: AddressRecord = serde_json::from_value(data)
                .map_err(|e| Error::Protocol(format!("invalid address: {}", e)))?;
            Ok(Extraction::Single(record))
        }
    }
}

/// `POST /store-addresses` request body
#[derive(Debug, Serialize)]
pub struct StoreAddressesRequest<'a> {
    pub addresses: &'a [AddressRecord],
}

/// Serde adapter for the `"true"` / `"false"` selection flag
///
/// Accepts a JSON string, a JSON bool, or null on input.
mod flag_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Option::<Flag>::deserialize(deserializer)? {
            Some(Flag::Bool(flag)) => flag,
            Some(Flag::Text(text)) => text.trim().eq_ignore_ascii_case("true"),
            None => false,
        })
    }
}
