/// Reset local data
///
/// Removes the database of events, profiles and journals while preserving config.json.
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::store::DB_FILENAME;

/// Run the reset command; returns whether anything was removed
pub fn run(data_root: &Path) -> Result<bool> {
    let db_path = data_root.join(DB_FILENAME);
    if !db_path.exists() {
        eprintln!("Nothing to reset in {}", data_root.display());
        return Ok(false);
    }

    fs::remove_file(&db_path).with_context(|| format!("Failed to remove {}", db_path.display()))?;
    info!("Removed {}", db_path.display());
    eprintln!("  ✓ Removed event database");
    eprintln!("✅ Reset complete");
    Ok(true)
}
