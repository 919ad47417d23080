use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::enrichment::{ConfidenceScores, EnrichedContact, EnrichmentSummary, Sources};

/// Lifecycle status of a stored contact
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq, Hash)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ContactStatus {
    Imported,
    Processing,
    Enriched,
    Failed,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 4] = [
        ContactStatus::Imported,
        ContactStatus::Processing,
        ContactStatus::Enriched,
        ContactStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Imported => "imported",
            ContactStatus::Processing => "processing",
            ContactStatus::Enriched => "enriched",
            ContactStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown contact status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ContactStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "imported" => Ok(ContactStatus::Imported),
            "processing" => Ok(ContactStatus::Processing),
            "enriched" => Ok(ContactStatus::Enriched),
            "failed" => Ok(ContactStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Contact fields as submitted by the user, canonical slots plus custom fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OriginalContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// Any import column that did not map onto a canonical slot
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, String>,
}

impl OriginalContact {
    /// Key used for duplicate detection: trimmed and lower-cased email
    pub fn email_key(&self) -> String {
        email_key(&self.email)
    }
}

pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: ContactStatus,
    pub original_contact: OriginalContact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched_contact: Option<EnrichedContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_scores: Option<ConfidenceScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Sources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment_summary: Option<EnrichmentSummary>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched_at: Option<i64>,
}

impl Contact {
    /// A freshly imported contact owned by `user_id`
    pub fn imported(user_id: Uuid, original_contact: OriginalContact, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: ContactStatus::Imported,
            original_contact,
            enriched_contact: None,
            confidence_scores: None,
            sources: None,
            enrichment_summary: None,
            created_at: now,
            updated_at: now,
            enriched_at: None,
        }
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactRequest {
    pub original_contact: OriginalContact,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ContactResponse {
    pub contact: Contact,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ContactListResponse {
    pub contacts: Vec<Contact>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ContactStatsResponse {
    pub total_contacts: u64,
    pub imported_contacts: u64,
    pub enriched_contacts: u64,
    pub processing_contacts: u64,
    pub failed_contacts: u64,
    pub average_confidence: u32,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EnrichContactsRequest {
    pub contact_ids: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct EnrichContactsResponse {
    pub message: String,
    pub count: usize,
}
