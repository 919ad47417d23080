use importers::{CanonicalField, CsvRowParser, FieldMapper, FieldNormalizer};
use shared_types::{
    Contact, FieldSummary, ImportContactsResponse, OriginalContact, RawContactRecord,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use uuid::Uuid;

use super::duplicates::{self, RowVerdict};
use crate::database::{ContactStore, InsertOutcome};
use crate::error::{ContactError, ContactResult};

/// Rows of one bulk import request
pub enum ImportRows {
    /// Already in the canonical shape
    Typed(Vec<OriginalContact>),
    /// Arbitrary field maps, normalized through a `FieldMapper`
    Raw {
        rows: Vec<RawContactRecord>,
        field_mapping: Option<BTreeMap<String, String>>,
    },
}

/// Creates contacts, singly or in bulk, with per-row duplicate reporting
#[derive(Clone)]
pub struct ContactImporter {
    store: Arc<dyn ContactStore>,
    normalizer: FieldNormalizer,
    chunk_size: usize,
}

impl ContactImporter {
    pub fn new(store: Arc<dyn ContactStore>, normalizer: FieldNormalizer, chunk_size: usize) -> Self {
        Self {
            store,
            normalizer,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn create_contact(
        &self,
        user_id: Uuid,
        original: OriginalContact,
    ) -> ContactResult<Contact> {
        if original.email_key().is_empty() {
            return Err(ContactError::InvalidInput("email is required".to_string()));
        }

        let contact = Contact::imported(user_id, original, super::now());
        self.store.insert_contact(&contact).await?;

        tracing::debug!("Created contact {} for user {}", contact.id, user_id);
        Ok(contact)
    }

    /// Parse a CSV upload into raw rows and import them
    pub async fn import_csv(
        &self,
        user_id: Uuid,
        body: &[u8],
        field_mapping: Option<BTreeMap<String, String>>,
    ) -> ContactResult<ImportContactsResponse> {
        let rows = CsvRowParser::new().parse_rows(body)?;
        self.import_batch(user_id, ImportRows::Raw {
            rows,
            field_mapping,
        })
        .await
    }

    /// Import a batch. Row problems become row errors; only a failed duplicate
    /// lookup fails the whole call. A failed chunk write stops the import and
    /// is reported in `write_error` next to whatever was already committed.
    pub async fn import_batch(
        &self,
        user_id: Uuid,
        rows: ImportRows,
    ) -> ContactResult<ImportContactsResponse> {
        let (originals, mut field_summary) = self.map_rows(rows);
        let total = originals.len();

        let candidates: Vec<(usize, String)> = originals
            .iter()
            .enumerate()
            .map(|(index, original)| (index, original.email_key()))
            .filter(|(_, key)| !key.is_empty())
            .collect();
        let report = duplicates::resolve(self.store.as_ref(), user_id, &candidates).await?;

        let now = super::now();
        let mut errors: Vec<(usize, String)> = Vec::new();
        let mut rows = Vec::new();
        let mut pending = Vec::new();

        for (index, original) in originals.into_iter().enumerate() {
            let key = original.email_key();
            if key.is_empty() {
                errors.push((index, format!("Row {}: missing email", index + 1)));
                continue;
            }

            match report.verdict(index, &key) {
                RowVerdict::Accept => {
                    rows.push(index);
                    pending.push(Contact::imported(user_id, original, now));
                }
                RowVerdict::Existing => {
                    errors.push((index, existing_error(index, &original.email)));
                }
                RowVerdict::WithinBatch { first_index } => errors.push((
                    index,
                    format!(
                        "Row {}: Duplicate email {} (first seen in row {})",
                        index + 1,
                        original.email,
                        first_index + 1
                    ),
                )),
            }
        }

        let mut created = Vec::with_capacity(pending.len());
        let mut write_error = None;

        for (chunk_rows, chunk) in rows
            .chunks(self.chunk_size)
            .zip(pending.chunks(self.chunk_size))
        {
            match self.store.insert_contacts(chunk).await {
                Ok(outcomes) => {
                    for ((index, contact), outcome) in chunk_rows.iter().zip(chunk).zip(outcomes) {
                        match outcome {
                            InsertOutcome::Inserted => created.push(contact.clone()),
                            InsertOutcome::Duplicate => errors.push((
                                *index,
                                existing_error(*index, &contact.original_contact.email),
                            )),
                        }
                    }
                }
                Err(e) => {
                    let e = ContactError::from(e);
                    tracing::error!(
                        "Bulk import for user {} stopped after {} contacts: {}",
                        user_id,
                        created.len(),
                        e
                    );
                    write_error = Some(e.to_string());
                    break;
                }
            }
        }

        errors.sort_by_key(|(index, _)| *index);
        field_summary.processed_contacts = created.len();

        tracing::info!(
            "Imported {} of {} contacts for user {} ({} row errors)",
            created.len(),
            total,
            user_id,
            errors.len()
        );

        Ok(ImportContactsResponse {
            message: if write_error.is_some() {
                "Bulk import stopped early".to_string()
            } else {
                "Bulk import completed".to_string()
            },
            total_created: created.len(),
            skipped_contacts: total - created.len(),
            processed_contacts: created,
            errors: errors.into_iter().map(|(_, message)| message).collect(),
            field_summary,
            write_error,
        })
    }

    fn map_rows(&self, rows: ImportRows) -> (Vec<OriginalContact>, FieldSummary) {
        match rows {
            ImportRows::Typed(contacts) => {
                let summary = summarize_typed(&contacts);
                (contacts, summary)
            }
            ImportRows::Raw {
                rows,
                field_mapping,
            } => {
                let mut mapper = FieldMapper::new(&self.normalizer, field_mapping);
                let contacts = rows.iter().map(|row| mapper.map_record(row)).collect();
                (contacts, mapper.into_summary())
            }
        }
    }
}

fn existing_error(index: usize, email: &str) -> String {
    format!("Row {}: Contact with email {} already exists", index + 1, email)
}

/// Field summary for pre-typed rows: populated canonical slots plus custom keys
fn summarize_typed(contacts: &[OriginalContact]) -> FieldSummary {
    let mut standard = BTreeSet::new();
    let mut custom = BTreeSet::new();

    for contact in contacts {
        for field in CanonicalField::ALL {
            let populated = match field {
                CanonicalField::Name => !contact.name.trim().is_empty(),
                CanonicalField::Email => !contact.email.trim().is_empty(),
                CanonicalField::Phone => contact.phone.is_some(),
                CanonicalField::Company => contact.company.is_some(),
                CanonicalField::Title => contact.title.is_some(),
                CanonicalField::Industry => contact.industry.is_some(),
                CanonicalField::Location => contact.location.is_some(),
                CanonicalField::Department => contact.department.is_some(),
            };
            if populated {
                standard.insert(field.as_str().to_string());
            }
        }
        custom.extend(contact.custom_fields.keys().cloned());
    }

    let standard_fields: Vec<String> = standard.into_iter().collect();
    let custom_fields: Vec<String> = custom.into_iter().collect();
    let mut field_mappings = BTreeMap::new();
    for name in standard_fields.iter().chain(custom_fields.iter()) {
        field_mappings.insert(name.clone(), name.clone());
    }

    FieldSummary {
        detected_fields: standard_fields.iter().chain(custom_fields.iter()).cloned().collect(),
        standard_fields,
        custom_fields,
        field_mappings,
        total_contacts: contacts.len(),
        processed_contacts: 0,
    }
}
