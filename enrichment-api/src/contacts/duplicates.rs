use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::database::ContactStore;
use crate::error::ContactResult;

/// Outcome of duplicate detection for one candidate row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowVerdict {
    Accept,
    /// The user already has a contact with this email
    Existing,
    /// An earlier row in the same batch carries this email
    WithinBatch { first_index: usize },
}

/// Store collisions and first in-batch occurrences for a list of candidate emails.
///
/// Store collisions take precedence: every row whose email is already stored is
/// reported as `Existing`, whatever its position. Among the rest, the first
/// occurrence is accepted and later ones point back at it.
#[derive(Debug, Default)]
pub struct DuplicateReport {
    pub existing: HashSet<String>,
    pub first_occurrence: HashMap<String, usize>,
}

impl DuplicateReport {
    /// Build the report from already-known store collisions
    pub fn new<'a>(existing: HashSet<String>, candidates: impl IntoIterator<Item = (usize, &'a str)>) -> Self {
        let mut first_occurrence = HashMap::new();
        for (index, email_key) in candidates {
            if existing.contains(email_key) {
                continue;
            }
            first_occurrence.entry(email_key.to_string()).or_insert(index);
        }

        Self {
            existing,
            first_occurrence,
        }
    }

    pub fn verdict(&self, index: usize, email_key: &str) -> RowVerdict {
        if self.existing.contains(email_key) {
            return RowVerdict::Existing;
        }

        match self.first_occurrence.get(email_key) {
            Some(&first_index) if first_index != index => RowVerdict::WithinBatch { first_index },
            _ => RowVerdict::Accept,
        }
    }
}

/// One batched existence query for all candidates, then an in-order walk.
///
/// `candidates` pairs each row index with its normalized email key. A store
/// failure propagates with no partial report.
pub async fn resolve(
    store: &dyn ContactStore,
    user_id: Uuid,
    candidates: &[(usize, String)],
) -> ContactResult<DuplicateReport> {
    let keys: Vec<String> = candidates.iter().map(|(_, key)| key.clone()).collect();
    let existing = store.existing_emails(user_id, &keys).await?;

    Ok(DuplicateReport::new(
        existing,
        candidates.iter().map(|(index, key)| (*index, key.as_str())),
    ))
}
