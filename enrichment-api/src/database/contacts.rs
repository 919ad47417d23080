use crate::config::TimeoutConfig;
use crate::database::store::{
    ContactPage, ContactQuery, ContactStore, InsertOutcome, StatusGroup, StoreError,
};
use crate::database::AsyncDbConnection;
use async_trait::async_trait;
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::de::DeserializeOwned;
use shared_types::{Contact, ContactStatus, EnrichmentResponse};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

/// Stays well under SQLite's bound-parameter limit, leaving room for the user id
const EMAIL_LOOKUP_CHUNK: usize = 500;

const CONTACT_COLUMNS: &str = "id, user_id, status, original_contact, enriched_contact,
    confidence_scores, sources, enrichment_summary, created_at, updated_at, enriched_at";

/// `ContactStore` backed by the pooled SQLite database
#[derive(Clone)]
pub struct SqliteContactStore {
    conn: AsyncDbConnection,
    point_timeout: Duration,
    bulk_timeout: Duration,
}

impl SqliteContactStore {
    pub fn new(conn: AsyncDbConnection, timeouts: &TimeoutConfig) -> Self {
        Self {
            conn,
            point_timeout: timeouts.store(),
            bulk_timeout: timeouts.bulk(),
        }
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn get_contact(
        &self,
        user_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<Contact>, StoreError> {
        self.conn
            .run(self.point_timeout, move |conn| {
                get_contact(conn, user_id, contact_id)
            })
            .await
    }

    async fn insert_contact(&self, contact: &Contact) -> Result<(), StoreError> {
        let contact = contact.clone();
        self.conn
            .run(self.point_timeout, move |conn| insert_contact(conn, &contact))
            .await
    }

    async fn insert_contacts(
        &self,
        contacts: &[Contact],
    ) -> Result<Vec<InsertOutcome>, StoreError> {
        let contacts = contacts.to_vec();
        self.conn
            .run(self.bulk_timeout, move |conn| insert_contacts(conn, &contacts))
            .await
    }

    async fn existing_emails(
        &self,
        user_id: Uuid,
        email_keys: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        if email_keys.is_empty() {
            return Ok(HashSet::new());
        }

        let email_keys = email_keys.to_vec();
        self.conn
            .run(self.bulk_timeout, move |conn| {
                existing_emails(conn, user_id, &email_keys)
            })
            .await
    }

    async fn list_contacts(
        &self,
        user_id: Uuid,
        query: &ContactQuery,
    ) -> Result<ContactPage, StoreError> {
        let query = query.clone();
        self.conn
            .run(self.bulk_timeout, move |conn| list_contacts(conn, user_id, &query))
            .await
    }

    async fn transition(
        &self,
        user_id: Uuid,
        contact_id: Uuid,
        from: &[ContactStatus],
        to: ContactStatus,
        updated_at: i64,
    ) -> Result<bool, StoreError> {
        let from = from.to_vec();
        self.conn
            .run(self.point_timeout, move |conn| {
                transition(conn, user_id, contact_id, &from, to, updated_at)
            })
            .await
    }

    async fn complete_enrichment(
        &self,
        user_id: Uuid,
        contact_id: Uuid,
        enrichment: &EnrichmentResponse,
        enriched_at: i64,
    ) -> Result<bool, StoreError> {
        let enrichment = enrichment.clone();
        self.conn
            .run(self.point_timeout, move |conn| {
                complete_enrichment(conn, user_id, contact_id, &enrichment, enriched_at)
            })
            .await
    }

    async fn status_breakdown(&self, user_id: Uuid) -> Result<Vec<StatusGroup>, StoreError> {
        self.conn
            .run(self.bulk_timeout, move |conn| status_breakdown(conn, user_id))
            .await
    }

    async fn fail_interrupted(&self, updated_at: i64) -> Result<u64, StoreError> {
        self.conn
            .run(self.bulk_timeout, move |conn| {
                let changed = conn.execute(
                    "UPDATE contacts SET status = 'failed', updated_at = ?1
                     WHERE status = 'processing'",
                    params![updated_at],
                )?;
                Ok(changed as u64)
            })
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.conn
            .run(self.point_timeout, |conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
                Ok(())
            })
            .await
    }
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn uuid_column(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|text| serde_json::from_str(&text).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
    let status: String = row.get(2)?;
    let original: String = row.get(3)?;

    Ok(Contact {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        status: status.parse().map_err(|e| conversion_error(2, e))?,
        original_contact: serde_json::from_str(&original).map_err(|e| conversion_error(3, e))?,
        enriched_contact: json_column(row, 4)?,
        confidence_scores: json_column(row, 5)?,
        sources: json_column(row, 6)?,
        enrichment_summary: json_column(row, 7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        enriched_at: row.get(10)?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn to_json<T: serde::Serialize>(value: Option<&T>) -> Result<Option<String>, StoreError> {
    Ok(value.map(serde_json::to_string).transpose()?)
}

/// Search key for names; SQLite's `LOWER()` only folds ASCII
pub(crate) fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub fn get_contact(
    conn: &Connection,
    user_id: Uuid,
    contact_id: Uuid,
) -> Result<Option<Contact>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1 AND user_id = ?2"
    ))?;

    let mut rows = stmt.query(params![contact_id.to_string(), user_id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_contact(row)?)),
        None => Ok(None),
    }
}

pub fn insert_contact(conn: &Connection, contact: &Contact) -> Result<(), StoreError> {
    let original = serde_json::to_string(&contact.original_contact)?;
    let overall_confidence = contact
        .enrichment_summary
        .as_ref()
        .map(|summary| summary.overall_confidence);

    let result = conn.execute(
        "INSERT INTO contacts
         (id, user_id, status, name, email, email_key, name_key, original_contact,
          enriched_contact, confidence_scores, sources, enrichment_summary,
          overall_confidence, created_at, updated_at, enriched_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            contact.id.to_string(),
            contact.user_id.to_string(),
            contact.status.as_str(),
            &contact.original_contact.name,
            &contact.original_contact.email,
            contact.original_contact.email_key(),
            name_key(&contact.original_contact.name),
            original,
            to_json(contact.enriched_contact.as_ref())?,
            to_json(contact.confidence_scores.as_ref())?,
            to_json(contact.sources.as_ref())?,
            to_json(contact.enrichment_summary.as_ref())?,
            overall_confidence,
            contact.created_at,
            contact.updated_at,
            contact.enriched_at,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => {
            Err(StoreError::Duplicate(contact.original_contact.email.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn insert_contacts(
    conn: &mut Connection,
    contacts: &[Contact],
) -> Result<Vec<InsertOutcome>, StoreError> {
    let tx = conn.transaction()?;
    let mut outcomes = Vec::with_capacity(contacts.len());

    for contact in contacts {
        match insert_contact(&tx, contact) {
            Ok(()) => outcomes.push(InsertOutcome::Inserted),
            Err(StoreError::Duplicate(_)) => outcomes.push(InsertOutcome::Duplicate),
            // Dropping the transaction rolls the chunk back
            Err(e) => return Err(e),
        }
    }

    tx.commit()?;
    Ok(outcomes)
}

pub fn existing_emails(
    conn: &Connection,
    user_id: Uuid,
    email_keys: &[String],
) -> Result<HashSet<String>, StoreError> {
    let unique: Vec<String> = email_keys
        .iter()
        .cloned()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut found = HashSet::new();
    for chunk in unique.chunks(EMAIL_LOOKUP_CHUNK) {
        let sql = format!(
            "SELECT email_key FROM contacts WHERE user_id = ? AND email_key IN ({})",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let values = std::iter::once(user_id.to_string()).chain(chunk.iter().cloned());
        let rows = stmt.query_map(params_from_iter(values), |row| row.get::<_, String>(0))?;
        for row in rows {
            found.insert(row?);
        }
    }

    Ok(found)
}

pub fn list_contacts(
    conn: &Connection,
    user_id: Uuid,
    query: &ContactQuery,
) -> Result<ContactPage, StoreError> {
    let mut clauses = vec!["user_id = ?"];
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.to_string())];

    if let Some(status) = query.status {
        clauses.push("status = ?");
        values.push(Box::new(status.as_str()));
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        clauses.push("(name_key LIKE ? ESCAPE '\\' OR email_key LIKE ? ESCAPE '\\')");
        values.push(Box::new(pattern.clone()));
        values.push(Box::new(pattern));
    }

    let where_sql = clauses.join(" AND ");

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM contacts WHERE {where_sql}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    values.push(Box::new(query.limit as i64));
    values.push(Box::new(query.offset as i64));

    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE {where_sql}
         ORDER BY created_at DESC, id ASC LIMIT ? OFFSET ?"
    ))?;
    let contacts = stmt
        .query_map(params_from_iter(values.iter()), row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ContactPage {
        contacts,
        total: total as u64,
    })
}

pub fn transition(
    conn: &Connection,
    user_id: Uuid,
    contact_id: Uuid,
    from: &[ContactStatus],
    to: ContactStatus,
    updated_at: i64,
) -> Result<bool, StoreError> {
    if from.is_empty() {
        return Ok(false);
    }

    let sql = format!(
        "UPDATE contacts SET status = ?, updated_at = ?
         WHERE id = ? AND user_id = ? AND status IN ({})",
        placeholders(from.len())
    );

    let mut values: Vec<Box<dyn ToSql>> = vec![
        Box::new(to.as_str()),
        Box::new(updated_at),
        Box::new(contact_id.to_string()),
        Box::new(user_id.to_string()),
    ];
    for status in from {
        values.push(Box::new(status.as_str()));
    }

    let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(changed > 0)
}

pub fn complete_enrichment(
    conn: &Connection,
    user_id: Uuid,
    contact_id: Uuid,
    enrichment: &EnrichmentResponse,
    enriched_at: i64,
) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "UPDATE contacts SET
            status = 'enriched',
            enriched_contact = ?1,
            confidence_scores = ?2,
            sources = ?3,
            enrichment_summary = ?4,
            overall_confidence = ?5,
            updated_at = ?6,
            enriched_at = ?6
         WHERE id = ?7 AND user_id = ?8 AND status = 'processing'",
        params![
            serde_json::to_string(&enrichment.enriched_contact)?,
            serde_json::to_string(&enrichment.confidence_scores)?,
            serde_json::to_string(&enrichment.sources)?,
            serde_json::to_string(&enrichment.enrichment_summary)?,
            enrichment.enrichment_summary.overall_confidence,
            enriched_at,
            contact_id.to_string(),
            user_id.to_string(),
        ],
    )?;

    Ok(changed > 0)
}

pub fn status_breakdown(conn: &Connection, user_id: Uuid) -> Result<Vec<StatusGroup>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*), AVG(overall_confidence)
         FROM contacts
         WHERE user_id = ?1
         GROUP BY status",
    )?;

    let groups = stmt
        .query_map(params![user_id.to_string()], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok(StatusGroup {
                status: status.parse().map_err(|e| conversion_error(0, e))?,
                count: count as u64,
                average_confidence: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(groups)
}
