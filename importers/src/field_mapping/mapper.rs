use std::collections::{BTreeMap, BTreeSet};

use shared_types::{FieldSummary, OriginalContact, RawContactRecord};

use super::{apply_field, CanonicalField, FieldNormalizer, FieldTarget};

/// Turns raw import rows into contacts, honouring explicit column overrides
/// before falling back to automatic normalization.
pub struct FieldMapper<'a> {
    normalizer: &'a FieldNormalizer,
    overrides: BTreeMap<String, String>,
    summary: FieldSummary,
    seen: BTreeSet<String>,
}

impl<'a> FieldMapper<'a> {
    pub fn new(normalizer: &'a FieldNormalizer, overrides: Option<BTreeMap<String, String>>) -> Self {
        Self {
            normalizer,
            overrides: overrides.unwrap_or_default(),
            summary: FieldSummary::default(),
            seen: BTreeSet::new(),
        }
    }

    /// Target for a raw column, or `None` when an override drops the column
    pub fn resolve(&self, raw_field: &str) -> Option<FieldTarget> {
        if let Some(target) = self.overrides.get(raw_field) {
            let target = target.trim();
            if target.is_empty() {
                return None;
            }
            return Some(match CanonicalField::from_name(target) {
                Some(field) => FieldTarget::Canonical(field),
                None => FieldTarget::Custom(target.to_string()),
            });
        }

        Some(self.normalizer.resolve(raw_field))
    }

    /// Build one contact from a raw row and record its columns in the summary
    pub fn map_record(&mut self, record: &RawContactRecord) -> OriginalContact {
        let mut contact = OriginalContact::default();

        for (raw_field, value) in record {
            let target = self.resolve(raw_field);
            self.note_field(raw_field, target.as_ref());

            if let Some(target) = target {
                apply_field(&mut contact, target.name(), value);
            }
        }

        self.summary.total_contacts += 1;
        contact
    }

    fn note_field(&mut self, raw_field: &str, target: Option<&FieldTarget>) {
        if !self.seen.insert(raw_field.to_string()) {
            return;
        }

        self.summary.detected_fields.push(raw_field.to_string());
        match target {
            Some(FieldTarget::Canonical(field)) => {
                self.summary.standard_fields.push(raw_field.to_string());
                self.summary
                    .field_mappings
                    .insert(raw_field.to_string(), field.as_str().to_string());
            }
            Some(FieldTarget::Custom(name)) => {
                self.summary.custom_fields.push(raw_field.to_string());
                self.summary
                    .field_mappings
                    .insert(raw_field.to_string(), name.clone());
            }
            None => {}
        }
    }

    /// Summary of every column seen so far; `processed_contacts` is left for the caller
    pub fn into_summary(self) -> FieldSummary {
        self.summary
    }
}
