use std::collections::HashMap;

/// The eight contact attributes recognised by the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Name,
    Email,
    Phone,
    Company,
    Title,
    Industry,
    Location,
    Department,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::Name,
        CanonicalField::Email,
        CanonicalField::Phone,
        CanonicalField::Company,
        CanonicalField::Title,
        CanonicalField::Industry,
        CanonicalField::Location,
        CanonicalField::Department,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Email => "email",
            CanonicalField::Phone => "phone",
            CanonicalField::Company => "company",
            CanonicalField::Title => "title",
            CanonicalField::Industry => "industry",
            CanonicalField::Location => "location",
            CanonicalField::Department => "department",
        }
    }

    /// Exact match against a canonical field name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

/// Synonyms understood out of the box
const STANDARD_SYNONYMS: &[(&str, CanonicalField)] = &[
    ("name", CanonicalField::Name),
    ("full name", CanonicalField::Name),
    ("fullname", CanonicalField::Name),
    ("email", CanonicalField::Email),
    ("email address", CanonicalField::Email),
    ("e-mail", CanonicalField::Email),
    ("phone", CanonicalField::Phone),
    ("phone number", CanonicalField::Phone),
    ("mobile", CanonicalField::Phone),
    ("company", CanonicalField::Company),
    ("organization", CanonicalField::Company),
    ("employer", CanonicalField::Company),
    ("title", CanonicalField::Title),
    ("job title", CanonicalField::Title),
    ("position", CanonicalField::Title),
    ("role", CanonicalField::Title),
    ("industry", CanonicalField::Industry),
    ("sector", CanonicalField::Industry),
    ("location", CanonicalField::Location),
    ("city", CanonicalField::Location),
    ("address", CanonicalField::Location),
    ("department", CanonicalField::Department),
    ("dept", CanonicalField::Department),
    ("division", CanonicalField::Department),
];

/// Lower-case, trim, turn `_`, `-` and `.` into spaces and collapse whitespace runs
pub fn clean_field_name(field_name: &str) -> String {
    field_name
        .to_lowercase()
        .replace(['_', '-', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read-only mapping from cleaned synonyms to canonical fields
#[derive(Debug, Clone)]
pub struct FieldMappingTable {
    synonyms: HashMap<String, CanonicalField>,
}

impl FieldMappingTable {
    /// Build a table; synonym keys are cleaned the same way incoming names are
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, CanonicalField)>) -> Self {
        let synonyms = entries
            .into_iter()
            .map(|(synonym, field)| (clean_field_name(synonym), field))
            .collect();

        Self { synonyms }
    }

    pub fn standard() -> Self {
        Self::new(STANDARD_SYNONYMS.iter().copied())
    }

    pub fn lookup(&self, cleaned: &str) -> Option<CanonicalField> {
        self.synonyms.get(cleaned).copied()
    }

    pub fn len(&self) -> usize {
        self.synonyms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty()
    }
}

impl Default for FieldMappingTable {
    fn default() -> Self {
        Self::standard()
    }
}
