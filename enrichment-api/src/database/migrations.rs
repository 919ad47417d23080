use rusqlite::{params, Connection};

use super::contacts::name_key;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // WAL lets readers proceed while a bulk import holds the write lock
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Create contacts table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id VARCHAR PRIMARY KEY,
            user_id VARCHAR NOT NULL,
            status VARCHAR NOT NULL DEFAULT 'imported'
                CHECK (status IN ('imported', 'processing', 'enriched', 'failed')),
            name VARCHAR NOT NULL,
            email VARCHAR NOT NULL,
            email_key VARCHAR NOT NULL,
            name_key VARCHAR NOT NULL DEFAULT '',
            original_contact VARCHAR NOT NULL,
            enriched_contact VARCHAR,
            confidence_scores VARCHAR,
            sources VARCHAR,
            enrichment_summary VARCHAR,
            overall_confidence INTEGER,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL,
            enriched_at BIGINT,
            CHECK (status <> 'enriched' OR (enriched_at IS NOT NULL AND enriched_contact IS NOT NULL))
        )",
        [],
    )?;

    add_name_key_column(conn)?;

    // One email per user; backstop for concurrent imports racing on the same address
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_contacts_user_email
            ON contacts(user_id, email_key)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_user_status
            ON contacts(user_id, status)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_user_created
            ON contacts(user_id, created_at DESC)",
        [],
    )?;

    Ok(())
}

/// Databases created before `name_key` existed get the column and a backfill.
/// SQLite's `LOWER()` only folds ASCII, so keys are computed here.
fn add_name_key_column(conn: &Connection) -> anyhow::Result<()> {
    let has_name_key: bool = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('contacts') WHERE name = 'name_key'",
        [],
        |row| {
            let count: i64 = row.get(0)?;
            Ok(count > 0)
        },
    )?;
    if has_name_key {
        return Ok(());
    }

    tracing::info!("Adding name_key column to contacts table");
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "ALTER TABLE contacts ADD COLUMN name_key VARCHAR NOT NULL DEFAULT ''",
        [],
    )?;

    let rows: Vec<(String, String)> = {
        let mut stmt = tx.prepare("SELECT id, name FROM contacts")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<_, _>>()?
    };
    for (id, name) in &rows {
        tx.execute(
            "UPDATE contacts SET name_key = ?1 WHERE id = ?2",
            params![name_key(name), id],
        )?;
    }

    tx.commit()?;
    Ok(())
}
