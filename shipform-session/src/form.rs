//! Form binder
//!
//! `FormFields` is the value model of the visible shipping form. The view
//! layer reads it to render and writes user edits back through
//! [`FormFields::set`]. Projection from an address record and capture of
//! the dimension fields are plain functions so they can be tested without
//! any rendering environment.

use shipform_common::{AddressRecord, DimensionRecord};
use std::fmt;
use std::str::FromStr;

/// Identifier of one visible form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    ToName,
    PhoneTo,
    Street1To,
    CompanyTo,
    Street2To,
    CityTo,
    StateTo,
    ZipTo,
    OrderId,
    Weight,
    Length,
    Width,
    Height,
    Description,
}

impl FieldId {
    /// Every visible field, in form order
    pub const ALL: [FieldId; 14] = [
        FieldId::ToName,
        FieldId::PhoneTo,
        FieldId::Street1To,
        FieldId::CompanyTo,
        FieldId::Street2To,
        FieldId::CityTo,
        FieldId::StateTo,
        FieldId::ZipTo,
        FieldId::OrderId,
        FieldId::Weight,
        FieldId::Length,
        FieldId::Width,
        FieldId::Height,
        FieldId::Description,
    ];

    /// Fields that must be non-blank for a submission to go out
    pub const REQUIRED: [FieldId; 9] = [
        FieldId::ToName,
        FieldId::Street1To,
        FieldId::CityTo,
        FieldId::StateTo,
        FieldId::ZipTo,
        FieldId::Weight,
        FieldId::Length,
        FieldId::Width,
        FieldId::Height,
    ];

    /// Field name as posted in the submission form
    pub fn name(self) -> &'static str {
        match self {
            FieldId::ToName => "ToName",
            FieldId::PhoneTo => "PhoneTo",
            FieldId::Street1To => "Street1To",
            FieldId::CompanyTo => "CompanyTo",
            FieldId::Street2To => "Street2To",
            FieldId::CityTo => "CityTo",
            FieldId::StateTo => "StateTo",
            FieldId::ZipTo => "ZipTo",
            FieldId::OrderId => "order_id",
            FieldId::Weight => "Weight",
            FieldId::Length => "length",
            FieldId::Width => "width",
            FieldId::Height => "height",
            FieldId::Description => "description",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldId {
    type Err = String;

    /// Case-insensitive match on the posted field name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldId::ALL
            .iter()
            .copied()
            .find(|field| field.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown field: {}", s))
    }
}

/// Current values of every visible form field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub to_name: String,
    pub phone_to: String,
    pub street1_to: String,
    pub company_to: String,
    pub street2_to: String,
    pub city_to: String,
    pub state_to: String,
    pub zip_to: String,
    pub order_id: String,
    pub weight: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub description: String,
}

impl FormFields {
    pub fn get(&self, field: FieldId) -> &str {
        match field {
            FieldId::ToName => &self.to_name,
            FieldId::PhoneTo => &self.phone_to,
            FieldId::Street1To => &self.street1_to,
            FieldId::CompanyTo => &self.company_to,
            FieldId::Street2To => &self.street2_to,
            FieldId::CityTo => &self.city_to,
            FieldId::StateTo => &self.state_to,
            FieldId::ZipTo => &self.zip_to,
            FieldId::OrderId => &self.order_id,
            FieldId::Weight => &self.weight,
            FieldId::Length => &self.length,
            FieldId::Width => &self.width,
            FieldId::Height => &self.height,
            FieldId::Description => &self.description,
        }
    }

    pub fn set(&mut self, field: FieldId, value: impl Into<String>) {
        let slot = match field {
            FieldId::ToName => &mut self.to_name,
            FieldId::PhoneTo => &mut self.phone_to,
            FieldId::Street1To => &mut self.street1_to,
            FieldId::CompanyTo => &mut self.company_to,
            FieldId::Street2To => &mut self.street2_to,
            FieldId::CityTo => &mut self.city_to,
            FieldId::StateTo => &mut self.state_to,
            FieldId::ZipTo => &mut self.zip_to,
            FieldId::OrderId => &mut self.order_id,
            FieldId::Weight => &mut self.weight,
            FieldId::Length => &mut self.length,
            FieldId::Width => &mut self.width,
            FieldId::Height => &mut self.height,
            FieldId::Description => &mut self.description,
        };
        *slot = value.into();
    }

    /// Whether the field is blank after trimming
    pub fn is_blank(&self, field: FieldId) -> bool {
        self.get(field).trim().is_empty()
    }

    /// `(name, value)` pairs for every visible field, in form order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        FieldId::ALL
            .iter()
            .map(|field| (field.name().to_string(), self.get(*field).to_string()))
            .collect()
    }
}

/// Write `record` onto the form, then overlay cached dimensions if any
///
/// Every address field is overwritten (missing values become empty strings).
/// Dimension fields are only touched when `cached` is present; extraction
/// responses never carry dimensions.
pub fn project(record: &AddressRecord, cached: Option<&DimensionRecord>, form: &mut FormFields) {
    fn text(value: &Option<String>) -> String {
        value.clone().unwrap_or_default()
    }

    form.to_name = text(&record.to_name);
    form.phone_to = text(&record.phone_to);
    form.street1_to = text(&record.street1_to);
    form.company_to = text(&record.company_to);
    form.street2_to = text(&record.street2_to);
    form.city_to = text(&record.city_to);
    form.state_to = text(&record.state_to);
    form.zip_to = text(&record.zip_to);
    form.order_id = text(&record.order_id);

    if let Some(dimensions) = cached {
        apply_dimensions(dimensions, form);
    }
}

/// Overwrite the dimension fields with `dimensions`
pub fn apply_dimensions(dimensions: &DimensionRecord, form: &mut FormFields) {
    form.weight = dimensions.weight.clone();
    form.length = dimensions.length.clone();
    form.width = dimensions.width.clone();
    form.height = dimensions.height.clone();
    form.description = dimensions.description.clone();
}

/// Read the dimension fields back out of the form
pub fn capture_dimensions(form: &FormFields) -> DimensionRecord {
    DimensionRecord {
        weight: form.weight.clone(),
        length: form.length.clone(),
        width: form.width.clone(),
        height: form.height.clone(),
        description: form.description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> AddressRecord {
        AddressRecord {
            to_name: Some("Jane Doe".to_string()),
            street1_to: Some("1 Main St".to_string()),
            city_to: Some("Springfield".to_string()),
            state_to: Some("IL".to_string()),
            zip_to: Some("62701".to_string()),
            ..Default::default()
        }
    }

    fn dims(weight: &str) -> DimensionRecord {
        DimensionRecord {
            weight: weight.to_string(),
            length: "10".to_string(),
            width: "8".to_string(),
            height: "4".to_string(),
            description: "books".to_string(),
        }
    }

    #[test]
    fn test_project_writes_address_fields() {
        let mut form = FormFields::default();
        project(&jane(), None, &mut form);

        assert_eq!(form.to_name, "Jane Doe");
        assert_eq!(form.street1_to, "1 Main St");
        assert_eq!(form.city_to, "Springfield");
        assert_eq!(form.state_to, "IL");
        assert_eq!(form.zip_to, "62701");
        assert_eq!(form.phone_to, "");
        assert_eq!(form.order_id, "");
    }

    #[test]
    fn test_project_never_leaves_stale_address_values() {
        let mut form = FormFields::default();
        let full = AddressRecord {
            phone_to: Some("555-0100".to_string()),
            company_to: Some("Acme".to_string()),
            street2_to: Some("Apt 4".to_string()),
            order_id: Some("B1".to_string()),
            ..jane()
        };
        project(&full, None, &mut form);
        assert_eq!(form.company_to, "Acme");

        project(&AddressRecord::default(), None, &mut form);
        for field in &FieldId::ALL[..9] {
            assert_eq!(form.get(*field), "", "{} should be cleared", field);
        }
    }

    #[test]
    fn test_project_without_cache_keeps_dimensions() {
        let mut form = FormFields::default();
        apply_dimensions(&dims("3"), &mut form);

        project(&jane(), None, &mut form);
        assert_eq!(form.weight, "3");
        assert_eq!(form.description, "books");
    }

    #[test]
    fn test_project_with_cache_overwrites_dimensions() {
        let mut form = FormFields::default();
        apply_dimensions(&dims("3"), &mut form);

        project(&jane(), Some(&dims("7")), &mut form);
        assert_eq!(form.weight, "7");
    }

    #[test]
    fn test_capture_inverts_apply() {
        let mut form = FormFields::default();
        apply_dimensions(&dims("2.5"), &mut form);
        assert_eq!(capture_dimensions(&form), dims("2.5"));
    }

    #[test]
    fn test_field_names_parse_case_insensitively() {
        assert_eq!("weight".parse::<FieldId>().unwrap(), FieldId::Weight);
        assert_eq!("ORDER_ID".parse::<FieldId>().unwrap(), FieldId::OrderId);
        assert_eq!("Street1To".parse::<FieldId>().unwrap(), FieldId::Street1To);
        assert!("colour".parse::<FieldId>().is_err());
    }

    #[test]
    fn test_required_set() {
        assert_eq!(FieldId::REQUIRED.len(), 9);
        assert!(FieldId::Height.is_required());
        assert!(!FieldId::PhoneTo.is_required());
        assert!(!FieldId::Description.is_required());
        assert!(!FieldId::OrderId.is_required());
    }

    #[test]
    fn test_pairs_use_posted_names_in_order() {
        let mut form = FormFields::default();
        form.set(FieldId::Weight, "5");
        let pairs = form.to_pairs();
        assert_eq!(pairs.len(), 14);
        assert_eq!(pairs[0].0, "ToName");
        assert_eq!(pairs[8].0, "order_id");
        assert_eq!(pairs[9], ("Weight".to_string(), "5".to_string()));
    }
}
