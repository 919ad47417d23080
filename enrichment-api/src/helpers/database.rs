use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::database::Database;

const DEFAULT_POOL_SIZE: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns the path to the contacts database based on the operating system
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/contact-enrichment/contacts.db`
/// - **Linux**: `~/.local/share/contact-enrichment/contacts.db`
/// - **Windows**: `%LOCALAPPDATA%\contact-enrichment\contacts.db`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("contact-enrichment").join("contacts.db"))
}

/// Open the configured database, falling back to the platform data directory
pub fn initialize_database(config: &DatabaseConfig) -> anyhow::Result<Arc<Database>> {
    let db_path = match &config.path {
        Some(path) => path.clone(),
        None => get_db_path()?,
    };
    let pool_size = config.pool_size.unwrap_or(DEFAULT_POOL_SIZE).max(1);

    tracing::info!("Opening contacts database at {}", db_path.display());
    let db = Database::new(&db_path, pool_size, BUSY_TIMEOUT)?;
    Ok(Arc::new(db))
}
