use serde::Deserialize;
use shared_types::{Contact, ContactListResponse, ContactStatus};
use uuid::Uuid;

use super::parse_id;
use crate::database::{ContactQuery, ContactStore};
use crate::error::{ContactError, ContactResult};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw list parameters as they arrive on the query string.
///
/// Values that do not parse or fall out of range revert to their defaults
/// instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContactsParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListContactsParams {
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| (1..=MAX_PAGE_SIZE).contains(p))
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn status(&self) -> Option<ContactStatus> {
        let raw = self.status.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse() {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::debug!("Ignoring status filter: {}", e);
                None
            }
        }
    }
}

pub async fn get_contact(
    store: &dyn ContactStore,
    user_id: Uuid,
    contact_id: &str,
) -> ContactResult<Contact> {
    let contact_id = parse_id(contact_id)?;
    store
        .get_contact(user_id, contact_id)
        .await?
        .ok_or(ContactError::NotFound)
}

pub async fn list_contacts(
    store: &dyn ContactStore,
    user_id: Uuid,
    params: &ListContactsParams,
) -> ContactResult<ContactListResponse> {
    let page = params.page();
    let page_size = params.page_size();

    let query = ContactQuery {
        status: params.status(),
        search: params.search.clone(),
        offset: (page as u64 - 1) * page_size as u64,
        limit: page_size,
    };
    let result = store.list_contacts(user_id, &query).await?;

    Ok(ContactListResponse {
        contacts: result.contacts,
        total: result.total,
        page,
        page_size,
        total_pages: result.total.div_ceil(page_size as u64) as u32,
    })
}
