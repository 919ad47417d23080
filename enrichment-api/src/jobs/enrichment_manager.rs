use futures::FutureExt;
use shared_types::Contact;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::contacts::{lifecycle, now, parse_id};
use crate::database::ContactStore;
use crate::error::{ContactError, ContactResult};
use crate::integrations::EnrichmentProvider;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs enrichments, inline for single requests and as detached tasks for bulk ones
pub struct EnrichmentManager {
    store: Arc<dyn ContactStore>,
    provider: Arc<dyn EnrichmentProvider>,
    deadline: Duration,
    limiter: Option<Arc<Semaphore>>,
    active_jobs: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl EnrichmentManager {
    pub fn new(
        store: Arc<dyn ContactStore>,
        provider: Arc<dyn EnrichmentProvider>,
        deadline: Duration,
        max_concurrent: Option<usize>,
    ) -> Self {
        Self {
            store,
            provider,
            deadline,
            limiter: max_concurrent.map(|n| Arc::new(Semaphore::new(n.max(1)))),
            active_jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Enrich one owned contact and return the updated record.
    /// Provider failures leave the record `failed` and are returned to the caller.
    ///
    /// The work runs on its own task, so a caller that goes away mid-call still
    /// leaves the record `enriched` or `failed` once the provider settles.
    pub async fn enrich_one(&self, user_id: Uuid, contact_id: &str) -> ContactResult<Contact> {
        let contact_id = parse_id(contact_id)?;
        let store = self.store.clone();
        let provider = self.provider.clone();
        let limiter = self.limiter.clone();
        let deadline = self.deadline;

        let handle = tokio::spawn(async move {
            run_enrichment(
                store.as_ref(),
                provider.as_ref(),
                deadline,
                limiter.as_deref(),
                user_id,
                contact_id,
            )
            .await
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Enrichment of contact {} did not complete: {}", contact_id, e);
                lifecycle::mark_failed(self.store.as_ref(), user_id, contact_id, now()).await?;
                Err(ContactError::ProviderError(
                    "enrichment task did not complete".to_string(),
                ))
            }
        }
    }

    /// Start one detached enrichment per valid id and return how many were started.
    /// Malformed ids are skipped; per-item failures are only logged.
    pub async fn enrich_many(&self, user_id: Uuid, contact_ids: &[String]) -> usize {
        let mut accepted = 0;

        // Holding the registry lock across spawn keeps a fast task from
        // deregistering before it was registered
        let mut jobs = self.active_jobs.lock().await;

        for raw_id in contact_ids {
            let contact_id = match parse_id(raw_id) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Skipping bulk enrichment entry: {}", e);
                    continue;
                }
            };

            let job_id = Uuid::new_v4();
            let store = self.store.clone();
            let provider = self.provider.clone();
            let limiter = self.limiter.clone();
            let deadline = self.deadline;
            let active_jobs = self.active_jobs.clone();

            let handle = tokio::spawn(async move {
                let work = run_enrichment(
                    store.as_ref(),
                    provider.as_ref(),
                    deadline,
                    limiter.as_deref(),
                    user_id,
                    contact_id,
                );

                match AssertUnwindSafe(work).catch_unwind().await {
                    Ok(Ok(contact)) => {
                        tracing::info!("Enriched contact {} for user {}", contact.id, user_id);
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("Enrichment of contact {} failed: {}", contact_id, e);
                    }
                    Err(_) => {
                        tracing::error!("Enrichment of contact {} panicked", contact_id);
                        if let Err(e) =
                            lifecycle::mark_failed(store.as_ref(), user_id, contact_id, now()).await
                        {
                            tracing::error!("Could not mark contact {} failed: {}", contact_id, e);
                        }
                    }
                }

                let mut jobs = active_jobs.lock().await;
                jobs.remove(&job_id);
            });

            jobs.insert(job_id, handle);
            accepted += 1;
        }

        tracing::info!(
            "Started {} of {} bulk enrichments for user {}",
            accepted,
            contact_ids.len(),
            user_id
        );
        accepted
    }

    pub async fn active_count(&self) -> usize {
        self.active_jobs.lock().await.len()
    }

    /// Wait until every detached enrichment has finished
    pub async fn wait_idle(&self) {
        // Tasks deregister themselves; handles stay put so `shutdown` can still abort them
        while self.active_count().await > 0 {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    /// Give in-flight enrichments `grace` to finish, then abort the rest.
    /// Aborted records stay `processing` until the next startup marks them failed.
    pub async fn shutdown(&self, grace: Duration) {
        if tokio::time::timeout(grace, self.wait_idle()).await.is_ok() {
            return;
        }

        let mut jobs = self.active_jobs.lock().await;
        tracing::warn!("Aborting {} in-flight enrichments", jobs.len());
        for (_, handle) in jobs.drain() {
            handle.abort();
        }
    }

    /// Fail every record left `processing` by a previous run
    pub async fn restore_interrupted(&self) -> ContactResult<u64> {
        lifecycle::fail_interrupted(self.store.as_ref(), now()).await
    }
}

async fn run_enrichment(
    store: &dyn ContactStore,
    provider: &dyn EnrichmentProvider,
    deadline: Duration,
    limiter: Option<&Semaphore>,
    user_id: Uuid,
    contact_id: Uuid,
) -> ContactResult<Contact> {
    let contact = store
        .get_contact(user_id, contact_id)
        .await?
        .ok_or(ContactError::NotFound)?;

    lifecycle::begin_enrichment(store, user_id, contact_id, now()).await?;

    let permit = match limiter {
        Some(semaphore) => match semaphore.acquire().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                lifecycle::mark_failed(store, user_id, contact_id, now()).await?;
                return Err(ContactError::ProviderError(
                    "enrichment limiter closed".to_string(),
                ));
            }
        },
        None => None,
    };

    let outcome = match tokio::time::timeout(deadline, provider.enrich(&contact.original_contact)).await
    {
        Ok(Ok(enrichment)) => Ok(enrichment),
        Ok(Err(e)) => Err(ContactError::from(e)),
        Err(_) => Err(ContactError::ProviderTimeout(deadline)),
    };
    drop(permit);

    match outcome {
        Ok(enrichment) => {
            lifecycle::mark_enriched(store, user_id, contact_id, &enrichment, now()).await?;
            store
                .get_contact(user_id, contact_id)
                .await?
                .ok_or(ContactError::NotFound)
        }
        Err(e) => {
            if let Err(mark_err) = lifecycle::mark_failed(store, user_id, contact_id, now()).await {
                tracing::error!("Could not mark contact {} failed: {}", contact_id, mark_err);
            }
            Err(e)
        }
    }
}
