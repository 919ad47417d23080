use serde::{Deserialize, Serialize};

pub mod contact;
pub mod enrichment;
pub mod import;

pub use contact::{
    email_key, Contact, ContactListResponse, ContactResponse, ContactStatsResponse,
    ContactStatus, CreateContactRequest, EnrichContactsRequest, EnrichContactsResponse,
    OriginalContact, UnknownStatus,
};
pub use enrichment::{
    ConfidenceScores, EnrichedContact, EnrichmentRequest, EnrichmentResponse, EnrichmentSummary,
    Sources, MAX_CONFIDENCE,
};
pub use import::{
    BulkCreateContactsRequest, FieldSummary, ImportContactsRequest, ImportContactsResponse,
    RawContactRecord,
};

/// Error body returned by every API endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
