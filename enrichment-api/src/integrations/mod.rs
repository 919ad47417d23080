pub mod enrichment_client;

pub use enrichment_client::{EnrichmentProvider, HttpEnrichmentProvider, ProviderError};
