//! Importers Crate
//!
//! Turns heterogeneous contact input into the canonical [`shared_types::OriginalContact`]
//! shape before it reaches the ingestion pipeline.
//!
//! # Modules
//!
//! - `field_mapping`: column-name normalization, the synonym table and `apply_field`
//! - `csv_rows`: CSV uploads to raw field-map rows
//!
//! # Example
//!
//! ```rust,ignore
//! use importers::{CsvRowParser, FieldMapper, FieldNormalizer};
//!
//! let rows = CsvRowParser::new().parse_rows(&upload)?;
//! let normalizer = FieldNormalizer::default();
//! let mut mapper = FieldMapper::new(&normalizer, None);
//! let contacts: Vec<_> = rows.iter().map(|row| mapper.map_record(row)).collect();
//! ```

pub mod csv_rows;
pub mod field_mapping;

pub use csv_rows::CsvRowParser;
pub use field_mapping::{
    apply_field, clean_field_name, coerce_value, CanonicalField, FieldMapper, FieldMappingTable,
    FieldNormalizer, FieldTarget,
};

/// Import error types
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
