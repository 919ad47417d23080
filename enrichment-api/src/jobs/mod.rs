pub mod enrichment_manager;

pub use enrichment_manager::EnrichmentManager;
