//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use shared_types::{
    Contact, ContactStatus, EnrichedContact, EnrichmentResponse, EnrichmentSummary,
    OriginalContact,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::database::{
    ContactPage, ContactQuery, ContactStore, InsertOutcome, SqliteContactStore, StatusGroup,
    StoreError,
};
use crate::integrations::{EnrichmentProvider, ProviderError};

/// A store whose every call fails as if the database were unreachable
pub struct FailingStore;

fn down() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl ContactStore for FailingStore {
    async fn get_contact(&self, _: Uuid, _: Uuid) -> Result<Option<Contact>, StoreError> {
        Err(down())
    }

    async fn insert_contact(&self, _: &Contact) -> Result<(), StoreError> {
        Err(down())
    }

    async fn insert_contacts(&self, _: &[Contact]) -> Result<Vec<InsertOutcome>, StoreError> {
        Err(down())
    }

    async fn existing_emails(&self, _: Uuid, _: &[String]) -> Result<HashSet<String>, StoreError> {
        Err(down())
    }

    async fn list_contacts(&self, _: Uuid, _: &ContactQuery) -> Result<ContactPage, StoreError> {
        Err(down())
    }

    async fn transition(
        &self,
        _: Uuid,
        _: Uuid,
        _: &[ContactStatus],
        _: ContactStatus,
        _: i64,
    ) -> Result<bool, StoreError> {
        Err(down())
    }

    async fn complete_enrichment(
        &self,
        _: Uuid,
        _: Uuid,
        _: &EnrichmentResponse,
        _: i64,
    ) -> Result<bool, StoreError> {
        Err(down())
    }

    async fn status_breakdown(&self, _: Uuid) -> Result<Vec<StatusGroup>, StoreError> {
        Err(down())
    }

    async fn fail_interrupted(&self, _: i64) -> Result<u64, StoreError> {
        Err(down())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(down())
    }
}

/// Delegates to SQLite but fails chunk writes after `healthy_writes` successful ones
pub struct FlakyWriteStore {
    inner: SqliteContactStore,
    healthy_writes: usize,
    writes: AtomicUsize,
}

impl FlakyWriteStore {
    pub fn new(inner: SqliteContactStore, healthy_writes: usize) -> Self {
        Self {
            inner,
            healthy_writes,
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContactStore for FlakyWriteStore {
    async fn get_contact(&self, user_id: Uuid, id: Uuid) -> Result<Option<Contact>, StoreError> {
        self.inner.get_contact(user_id, id).await
    }

    async fn insert_contact(&self, contact: &Contact) -> Result<(), StoreError> {
        self.inner.insert_contact(contact).await
    }

    async fn insert_contacts(&self, contacts: &[Contact]) -> Result<Vec<InsertOutcome>, StoreError> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.healthy_writes {
            return Err(down());
        }
        self.inner.insert_contacts(contacts).await
    }

    async fn existing_emails(
        &self,
        user_id: Uuid,
        keys: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        self.inner.existing_emails(user_id, keys).await
    }

    async fn list_contacts(
        &self,
        user_id: Uuid,
        query: &ContactQuery,
    ) -> Result<ContactPage, StoreError> {
        self.inner.list_contacts(user_id, query).await
    }

    async fn transition(
        &self,
        user_id: Uuid,
        id: Uuid,
        from: &[ContactStatus],
        to: ContactStatus,
        at: i64,
    ) -> Result<bool, StoreError> {
        self.inner.transition(user_id, id, from, to, at).await
    }

    async fn complete_enrichment(
        &self,
        user_id: Uuid,
        id: Uuid,
        enrichment: &EnrichmentResponse,
        at: i64,
    ) -> Result<bool, StoreError> {
        self.inner.complete_enrichment(user_id, id, enrichment, at).await
    }

    async fn status_breakdown(&self, user_id: Uuid) -> Result<Vec<StatusGroup>, StoreError> {
        self.inner.status_breakdown(user_id).await
    }

    async fn fail_interrupted(&self, at: i64) -> Result<u64, StoreError> {
        self.inner.fail_interrupted(at).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

#[derive(Clone)]
enum Behavior {
    Succeed(u32),
    Fail,
    Hang(Duration),
}

/// Scriptable enrichment provider
pub struct StubProvider {
    behavior: Behavior,
    delay: Option<Duration>,
    fail_names: HashSet<String>,
    panic_names: HashSet<String>,
    in_flight: AtomicUsize,
    peak: Arc<AtomicUsize>,
}

impl StubProvider {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            fail_names: HashSet::new(),
            panic_names: HashSet::new(),
            in_flight: AtomicUsize::new(0),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn succeed(overall_confidence: u32) -> Self {
        Self::with_behavior(Behavior::Succeed(overall_confidence))
    }

    pub fn fail() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    pub fn hang(duration: Duration) -> Self {
        Self::with_behavior(Behavior::Hang(duration))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_for(mut self, name: &str) -> Self {
        self.fail_names.insert(name.to_string());
        self
    }

    pub fn panicking_for(mut self, name: &str) -> Self {
        self.panic_names.insert(name.to_string());
        self
    }

    /// Highest number of concurrent `enrich` calls observed
    pub fn peak_in_flight(&self) -> Arc<AtomicUsize> {
        self.peak.clone()
    }

    async fn respond(&self, contact: &OriginalContact) -> Result<EnrichmentResponse, ProviderError> {
        if self.panic_names.contains(&contact.name) {
            panic!("stub provider asked to panic for {}", contact.name);
        }
        if self.fail_names.contains(&contact.name) {
            return Err(ProviderError::Status {
                status: 500,
                body: "stub failure".to_string(),
            });
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Succeed(overall_confidence) => Ok(EnrichmentResponse {
                enriched_contact: EnrichedContact {
                    name: contact.name.clone(),
                    email: contact.email.clone(),
                    bio: Some("Enriched by stub".to_string()),
                    ..Default::default()
                },
                enrichment_summary: EnrichmentSummary {
                    fields_enriched: vec!["bio".to_string()],
                    fields_not_found: Vec::new(),
                    overall_confidence: *overall_confidence,
                },
                ..Default::default()
            }),
            Behavior::Fail => Err(ProviderError::Transport("connection reset".to_string())),
            Behavior::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Err(ProviderError::Transport("hung".to_string()))
            }
        }
    }
}

#[async_trait]
impl EnrichmentProvider for StubProvider {
    async fn enrich(&self, contact: &OriginalContact) -> Result<EnrichmentResponse, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = self.respond(contact).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
