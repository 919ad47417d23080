use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::contact::OriginalContact;

/// Highest confidence value a provider may report for a field
pub const MAX_CONFIDENCE: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub social_profiles: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Free-form work history as returned by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<serde_json::Value>,
}

/// Per-field confidence, 0-100
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceScores {
    #[serde(default)]
    pub name: u32,
    #[serde(default)]
    pub email: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub social_profiles: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<u32>,
}

impl ConfidenceScores {
    /// Clamp every score into the 0-100 range
    pub fn clamped(mut self) -> Self {
        let clamp = |v: u32| v.min(MAX_CONFIDENCE);
        self.name = clamp(self.name);
        self.email = clamp(self.email);
        for score in [
            &mut self.title,
            &mut self.company,
            &mut self.location,
            &mut self.bio,
            &mut self.skills,
            &mut self.industry,
        ] {
            *score = score.map(clamp);
        }
        for score in self.social_profiles.values_mut() {
            *score = clamp(*score);
        }
        self
    }
}

/// Provenance per enriched field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_profiles: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentSummary {
    #[serde(default)]
    pub fields_enriched: Vec<String>,
    #[serde(default)]
    pub fields_not_found: Vec<String>,
    #[serde(default)]
    pub overall_confidence: u32,
}

/// Body sent to the enrichment provider
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequest<'a> {
    pub contact_info: &'a OriginalContact,
}

/// Successful enrichment provider reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResponse {
    pub enriched_contact: EnrichedContact,
    #[serde(default)]
    pub confidence_scores: ConfidenceScores,
    #[serde(default)]
    pub sources: Sources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_contact: Option<OriginalContact>,
    #[serde(default)]
    pub enrichment_summary: EnrichmentSummary,
}

impl EnrichmentResponse {
    /// Normalise provider-reported confidence values into 0-100
    pub fn clamped(mut self) -> Self {
        self.confidence_scores = self.confidence_scores.clamped();
        self.enrichment_summary.overall_confidence = self
            .enrichment_summary
            .overall_confidence
            .min(MAX_CONFIDENCE);
        self
    }
}
