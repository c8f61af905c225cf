use anyhow::Result;
use std::path::Path;

use blobshard_core::path::BlobPath;

use super::store::open_store;

/// Best-effort delete of everything under `path` in every account.
pub async fn run(base_dir: &Path, path: Option<&str>, dry_run: bool) -> Result<()> {
    let (_, store) = open_store(base_dir)?;
    let path = path.map(BlobPath::from).unwrap_or_default();
    let prefix = path.as_key_prefix();
    let shown = if prefix.is_empty() { "(everything)" } else { prefix.as_str() };

    if dry_run {
        let accounts = if store.accounts().is_empty() {
            "default account".to_string()
        } else {
            store.accounts().accounts().join(", ")
        };
        println!(
            "Dry run: would delete {shown} in container '{}' on {accounts} ({})",
            store.container(),
            store.location_mode()
        );
        return Ok(());
    }

    // Failures are logged as warnings, not returned.
    store.delete(&path).await;
    println!("Cleanup of {shown} in container '{}' done", store.container());
    Ok(())
}
