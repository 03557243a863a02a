//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::debug;

/// Ensure the cache directory exists, creating it when missing.
pub async fn ensure_cache_dir(cache_dir: &Path) -> anyhow::Result<()> {
    if tokio::fs::metadata(cache_dir).await.is_ok() {
        return Ok(());
    }
    tokio::fs::create_dir_all(cache_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", cache_dir.display()))?;
    debug!(dir = %cache_dir.display(), "created cache directory");
    Ok(())
}
