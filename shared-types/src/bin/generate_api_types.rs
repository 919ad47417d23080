use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Contact types
    types.push(clean_type(ContactStatus::export_to_string()?));
    types.push(clean_type(OriginalContact::export_to_string()?));
    types.push(clean_type(Contact::export_to_string()?));
    types.push(clean_type(CreateContactRequest::export_to_string()?));
    types.push(clean_type(ContactResponse::export_to_string()?));
    types.push(clean_type(ContactListResponse::export_to_string()?));
    types.push(clean_type(ContactStatsResponse::export_to_string()?));

    // Enrichment types
    types.push(clean_type(EnrichedContact::export_to_string()?));
    types.push(clean_type(ConfidenceScores::export_to_string()?));
    types.push(clean_type(Sources::export_to_string()?));
    types.push(clean_type(EnrichmentSummary::export_to_string()?));
    types.push(clean_type(EnrichmentResponse::export_to_string()?));
    types.push(clean_type(EnrichContactsRequest::export_to_string()?));
    types.push(clean_type(EnrichContactsResponse::export_to_string()?));

    // Import types
    types.push(clean_type(BulkCreateContactsRequest::export_to_string()?));
    types.push(clean_type(ImportContactsRequest::export_to_string()?));
    types.push(clean_type(FieldSummary::export_to_string()?));
    types.push(clean_type(ImportContactsResponse::export_to_string()?));

    let output_dir = Path::new("../frontend/types/api");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

/// Strip ts-rs banners and cross-file imports; every type lands in the same `types.ts`
fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let body = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n", body.trim())
}
