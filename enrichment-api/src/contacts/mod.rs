//! Contact domain operations on top of a [`ContactStore`](crate::database::ContactStore):
//! duplicate detection, bulk import, lifecycle transitions, listing and stats.

pub mod duplicates;
pub mod import;
pub mod lifecycle;
pub mod queries;
pub mod stats;

pub use duplicates::{DuplicateReport, RowVerdict};
pub use import::{ContactImporter, ImportRows};
pub use queries::ListContactsParams;

use uuid::Uuid;

use crate::error::ContactError;

/// Parse a contact or user id coming from a path, body or token table
pub fn parse_id(raw: &str) -> Result<Uuid, ContactError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ContactError::InvalidIdentifier(raw.to_string()))
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
