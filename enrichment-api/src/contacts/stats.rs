use shared_types::{ContactStatsResponse, ContactStatus};
use uuid::Uuid;

use crate::database::{ContactStore, StatusGroup};
use crate::error::ContactResult;

/// Per-status counts and the mean confidence of enriched contacts, from one grouped query
pub async fn contact_stats(
    store: &dyn ContactStore,
    user_id: Uuid,
) -> ContactResult<ContactStatsResponse> {
    let groups = store.status_breakdown(user_id).await?;
    Ok(summarize(&groups))
}

pub fn summarize(groups: &[StatusGroup]) -> ContactStatsResponse {
    let mut stats = ContactStatsResponse::default();

    for group in groups {
        stats.total_contacts += group.count;
        match group.status {
            ContactStatus::Imported => stats.imported_contacts += group.count,
            ContactStatus::Processing => stats.processing_contacts += group.count,
            ContactStatus::Failed => stats.failed_contacts += group.count,
            ContactStatus::Enriched => {
                stats.enriched_contacts += group.count;
                stats.average_confidence = group
                    .average_confidence
                    .map(|avg| avg.trunc().max(0.0) as u32)
                    .unwrap_or(0);
            }
        }
    }

    stats
}
