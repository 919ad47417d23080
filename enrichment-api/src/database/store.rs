use async_trait::async_trait;
use shared_types::{Contact, ContactStatus, EnrichmentResponse};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Contact with email {0} already exists")]
    Duplicate(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Unavailable(format!("Failed to get connection: {e}"))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("Failed to encode column: {e}"))
    }
}

/// Filters and window for listing a user's contacts
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
    pub status: Option<ContactStatus>,
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
    pub offset: u64,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    pub total: u64,
}

/// One row of the per-status aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct StatusGroup {
    pub status: ContactStatus,
    pub count: u64,
    /// Mean overall confidence of the group, `None` when no member carries one
    pub average_confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The (user, email) pair was already taken when the row was written
    Duplicate,
}

/// Durable, user-scoped storage for contact records.
///
/// Every read and write is scoped by `user_id`; a record owned by another user
/// behaves exactly like a missing one.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn get_contact(&self, user_id: Uuid, contact_id: Uuid)
        -> Result<Option<Contact>, StoreError>;

    /// Insert one record; a taken email yields `StoreError::Duplicate`
    async fn insert_contact(&self, contact: &Contact) -> Result<(), StoreError>;

    /// Insert a chunk in one transaction. Rows that hit the unique email index
    /// are reported per row; any other failure aborts the whole chunk.
    async fn insert_contacts(&self, contacts: &[Contact]) -> Result<Vec<InsertOutcome>, StoreError>;

    /// Which of `email_keys` the user already has, as one logical query
    async fn existing_emails(
        &self,
        user_id: Uuid,
        email_keys: &[String],
    ) -> Result<HashSet<String>, StoreError>;

    async fn list_contacts(&self, user_id: Uuid, query: &ContactQuery)
        -> Result<ContactPage, StoreError>;

    /// Move a record to `to` if its current status is one of `from`.
    /// Returns false when the record is missing or in another status.
    async fn transition(
        &self,
        user_id: Uuid,
        contact_id: Uuid,
        from: &[ContactStatus],
        to: ContactStatus,
        updated_at: i64,
    ) -> Result<bool, StoreError>;

    /// Persist an enrichment result and flip `processing` to `enriched` in one write
    async fn complete_enrichment(
        &self,
        user_id: Uuid,
        contact_id: Uuid,
        enrichment: &EnrichmentResponse,
        enriched_at: i64,
    ) -> Result<bool, StoreError>;

    async fn status_breakdown(&self, user_id: Uuid) -> Result<Vec<StatusGroup>, StoreError>;

    /// Mark every `processing` record as `failed`, for all users
    async fn fail_interrupted(&self, updated_at: i64) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
