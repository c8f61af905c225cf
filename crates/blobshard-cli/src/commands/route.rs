use anyhow::Result;
use std::path::Path;

use blobshard_core::config::BlobShardConfig;

use super::store::blob_path;

/// Print the account each blob name routes to. Needs no storage access.
pub fn run(base_dir: &Path, names: &[String], path: Option<&str>) -> Result<()> {
    let config = BlobShardConfig::load(&BlobShardConfig::default_path(base_dir))?;
    let settings = config.store_settings()?;
    let key_path = blob_path(&config, path).as_key_prefix();

    for name in names {
        let key = format!("{key_path}{name}");
        match settings.accounts.index_for(&key) {
            Some(idx) => println!("{key} -> {} (#{idx})", settings.accounts.accounts()[idx]),
            None => println!("{key} -> (default account)"),
        }
    }
    Ok(())
}
