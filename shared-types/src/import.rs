use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::contact::{Contact, OriginalContact};

/// A single untyped import row: column name to arbitrary JSON value
pub type RawContactRecord = BTreeMap<String, serde_json::Value>;

/// Bulk create with rows already in the canonical shape
#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct BulkCreateContactsRequest {
    pub contacts: Vec<OriginalContact>,
}

/// Bulk import of heterogeneous rows with optional explicit column mapping
#[derive(Debug, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportContactsRequest {
    pub contacts: Vec<RawContactRecord>,
    /// Raw column name to target field; wins over automatic normalization
    #[serde(default)]
    pub field_mapping: Option<BTreeMap<String, String>>,
}

/// How the columns of an import were interpreted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub detected_fields: Vec<String>,
    pub standard_fields: Vec<String>,
    pub custom_fields: Vec<String>,
    pub field_mappings: BTreeMap<String, String>,
    pub total_contacts: usize,
    pub processed_contacts: usize,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportContactsResponse {
    pub message: String,
    pub total_created: usize,
    pub processed_contacts: Vec<Contact>,
    pub errors: Vec<String>,
    pub skipped_contacts: usize,
    pub field_summary: FieldSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_error: Option<String>,
}
