//! Field normalization for heterogeneous contact imports.
//!
//! Incoming column names are cleaned and looked up in a [`FieldMappingTable`].
//! Names that match one of the canonical slots are assigned directly on an
//! [`OriginalContact`]; everything else is preserved as a custom field under
//! its cleaned name.

mod mapper;
mod table;

pub use mapper::FieldMapper;
pub use table::{clean_field_name, CanonicalField, FieldMappingTable};

use serde_json::Value;
use shared_types::OriginalContact;
use std::sync::Arc;

/// Where a column ends up on a contact record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    Canonical(CanonicalField),
    Custom(String),
}

impl FieldTarget {
    pub fn name(&self) -> &str {
        match self {
            FieldTarget::Canonical(field) => field.as_str(),
            FieldTarget::Custom(name) => name,
        }
    }
}

/// Maps arbitrary input field names onto the canonical contact schema
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    table: Arc<FieldMappingTable>,
}

impl FieldNormalizer {
    pub fn new(table: Arc<FieldMappingTable>) -> Self {
        Self { table }
    }

    /// Canonical name for `field_name`, or the cleaned name when no synonym matches
    pub fn normalize(&self, field_name: &str) -> String {
        self.resolve(field_name).name().to_string()
    }

    pub fn resolve(&self, field_name: &str) -> FieldTarget {
        let cleaned = clean_field_name(field_name);
        match self.table.lookup(&cleaned) {
            Some(field) => FieldTarget::Canonical(field),
            None => FieldTarget::Custom(cleaned),
        }
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(FieldMappingTable::standard()))
    }
}

/// String form of an import value; `None` for null or blank values
pub fn coerce_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Set `field_name` on `record`. Canonical names fill their slot, anything else
/// lands in the custom fields. Null and blank values are ignored.
pub fn apply_field(record: &mut OriginalContact, field_name: &str, value: &Value) {
    let Some(text) = coerce_value(value) else {
        return;
    };

    match CanonicalField::from_name(field_name) {
        Some(field) => set_canonical(record, field, text),
        None => {
            record.custom_fields.insert(field_name.to_string(), text);
        }
    }
}

fn set_canonical(record: &mut OriginalContact, field: CanonicalField, text: String) {
    match field {
        CanonicalField::Name => record.name = text,
        CanonicalField::Email => record.email = text,
        CanonicalField::Phone => record.phone = Some(text),
        CanonicalField::Company => record.company = Some(text),
        CanonicalField::Title => record.title = Some(text),
        CanonicalField::Industry => record.industry = Some(text),
        CanonicalField::Location => record.location = Some(text),
        CanonicalField::Department => record.department = Some(text),
    }
}
