use shared_types::{ContactStatus, EnrichmentResponse};
use uuid::Uuid;

use crate::database::ContactStore;
use crate::error::{ContactError, ContactResult};

/// Statuses from which a new enrichment may start
pub const ENRICHABLE: [ContactStatus; 3] = [
    ContactStatus::Imported,
    ContactStatus::Failed,
    ContactStatus::Enriched,
];

/// Statuses a record may move into `to` from; the conditional updates below use it
pub fn allowed_from(to: ContactStatus) -> &'static [ContactStatus] {
    match to {
        ContactStatus::Processing => &ENRICHABLE,
        ContactStatus::Enriched | ContactStatus::Failed => &[ContactStatus::Processing],
        ContactStatus::Imported => &[],
    }
}

pub fn can_transition(from: ContactStatus, to: ContactStatus) -> bool {
    allowed_from(to).contains(&from)
}

/// Move an owned record into `processing`.
///
/// The status check and the write are one conditional update, so two callers
/// racing on the same record cannot both start.
pub async fn begin_enrichment(
    store: &dyn ContactStore,
    user_id: Uuid,
    contact_id: Uuid,
    now: i64,
) -> ContactResult<()> {
    if store
        .transition(
            user_id,
            contact_id,
            allowed_from(ContactStatus::Processing),
            ContactStatus::Processing,
            now,
        )
        .await?
    {
        return Ok(());
    }

    match store.get_contact(user_id, contact_id).await? {
        None => Err(ContactError::NotFound),
        Some(contact) => Err(ContactError::Conflict(format!(
            "Contact {} cannot start enrichment while {}",
            contact_id, contact.status
        ))),
    }
}

/// Persist the provider payload and flip to `enriched` in a single write
pub async fn mark_enriched(
    store: &dyn ContactStore,
    user_id: Uuid,
    contact_id: Uuid,
    enrichment: &EnrichmentResponse,
    now: i64,
) -> ContactResult<()> {
    if store
        .complete_enrichment(user_id, contact_id, enrichment, now)
        .await?
    {
        Ok(())
    } else {
        Err(ContactError::Conflict(format!(
            "Contact {contact_id} is no longer processing"
        )))
    }
}

/// Flip `processing` to `failed`, leaving any earlier enrichment data in place
pub async fn mark_failed(
    store: &dyn ContactStore,
    user_id: Uuid,
    contact_id: Uuid,
    now: i64,
) -> ContactResult<bool> {
    Ok(store
        .transition(
            user_id,
            contact_id,
            allowed_from(ContactStatus::Failed),
            ContactStatus::Failed,
            now,
        )
        .await?)
}

/// Records still `processing` at startup belong to a run that died; make them re-enrichable
pub async fn fail_interrupted(store: &dyn ContactStore, now: i64) -> ContactResult<u64> {
    let count = store.fail_interrupted(now).await?;
    if count > 0 {
        tracing::warn!("Marked {} interrupted enrichments as failed", count);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::contacts::tests::{contact, enrichment, test_store};

    #[test]
    fn test_transition_table() {
        use ContactStatus::*;
        assert!(can_transition(Imported, Processing));
        assert!(can_transition(Failed, Processing));
        assert!(can_transition(Enriched, Processing));
        assert!(!can_transition(Processing, Processing));
        assert!(can_transition(Processing, Enriched));
        assert!(can_transition(Processing, Failed));
        assert!(!can_transition(Imported, Enriched));
        assert!(!can_transition(Failed, Imported));

        // complete_enrichment's `status = 'processing'` guard mirrors this row
        assert_eq!(allowed_from(Enriched).to_vec(), vec![Processing]);
        assert_eq!(allowed_from(Processing).to_vec(), ENRICHABLE.to_vec());
        assert!(allowed_from(Imported).is_empty());
    }

    #[tokio::test]
    async fn test_processing_twice_is_a_conflict() {
        let (_dir, store) = test_store();
        let user = Uuid::new_v4();
        let record = contact(user, "Ada", "ada@example.com", 1);
        store.insert_contact(&record).await.unwrap();

        begin_enrichment(&store, user, record.id, 2).await.unwrap();
        let second = begin_enrichment(&store, user, record.id, 3).await;
        assert!(matches!(second, Err(ContactError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unowned_record_is_not_found() {
        let (_dir, store) = test_store();
        let record = contact(Uuid::new_v4(), "Ada", "ada@example.com", 1);
        store.insert_contact(&record).await.unwrap();

        let result = begin_enrichment(&store, Uuid::new_v4(), record.id, 2).await;
        assert!(matches!(result, Err(ContactError::NotFound)));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_enrichment() {
        let (_dir, store) = test_store();
        let user = Uuid::new_v4();
        let record = contact(user, "Ada", "ada@example.com", 1);
        store.insert_contact(&record).await.unwrap();

        begin_enrichment(&store, user, record.id, 2).await.unwrap();
        mark_enriched(&store, user, record.id, &enrichment(75), 3)
            .await
            .unwrap();

        // Re-enrichment that fails
        begin_enrichment(&store, user, record.id, 4).await.unwrap();
        assert!(mark_failed(&store, user, record.id, 5).await.unwrap());

        let stored = store.get_contact(user, record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContactStatus::Failed);
        assert_eq!(stored.enriched_at, Some(3));
        assert!(stored.enriched_contact.is_some());
    }

    #[tokio::test]
    async fn test_mark_enriched_requires_processing() {
        let (_dir, store) = test_store();
        let user = Uuid::new_v4();
        let record = contact(user, "Ada", "ada@example.com", 1);
        store.insert_contact(&record).await.unwrap();

        let result = mark_enriched(&store, user, record.id, &enrichment(75), 3).await;
        assert!(matches!(result, Err(ContactError::Conflict(_))));

        let stored = store.get_contact(user, record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContactStatus::Imported);
        assert!(stored.enriched_at.is_none());
    }

    #[tokio::test]
    async fn test_fail_interrupted_makes_records_enrichable() {
        let (_dir, store) = test_store();
        let user = Uuid::new_v4();
        let record = contact(user, "Ada", "ada@example.com", 1);
        store.insert_contact(&record).await.unwrap();
        begin_enrichment(&store, user, record.id, 2).await.unwrap();

        assert_eq!(fail_interrupted(&store, 10).await.unwrap(), 1);
        begin_enrichment(&store, user, record.id, 11).await.unwrap();
    }
}
