use std::path::Path;

use blobshard_core::config::BlobShardConfig;
use blobshard_core::path::BlobPath;
use blobshard_storage::container::ShardedBlobContainer;
use blobshard_storage::factory::create_storage_client;
use blobshard_storage::store::ShardedBlobStore;

/// Load config and build the sharded store it describes.
pub fn open_store(base_dir: &Path) -> anyhow::Result<(BlobShardConfig, ShardedBlobStore)> {
    let config_path = BlobShardConfig::default_path(base_dir);
    let config = BlobShardConfig::load(&config_path)?;
    let settings = config.store_settings()?;
    let client = create_storage_client(&config.storage)?;
    Ok((config, ShardedBlobStore::new(settings, client)))
}

/// Blob path for CLI blob commands: `--path` if given, else `repository.base_path`.
pub fn blob_path(config: &BlobShardConfig, path: Option<&str>) -> BlobPath {
    let path = path.or(config.repository.base_path.as_deref());
    path.map(BlobPath::from).unwrap_or_default()
}

/// Container handle for CLI blob commands.
pub fn open_container(
    base_dir: &Path,
    path: Option<&str>,
) -> anyhow::Result<(ShardedBlobStore, ShardedBlobContainer)> {
    let (config, store) = open_store(base_dir)?;
    let container = store.blob_container(blob_path(&config, path));
    Ok((store, container))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn path_flag_overrides_base_path() {
        let tmp = TempDir::new().unwrap();
        let mut config = BlobShardConfig::default_config(tmp.path());
        assert!(blob_path(&config, None).is_root());

        config.repository.base_path = Some("cluster-a".to_string());
        assert_eq!(blob_path(&config, None).as_key_prefix(), "cluster-a/");
        assert_eq!(blob_path(&config, Some("x/y")).as_key_prefix(), "x/y/");
    }

    #[test]
    fn open_store_from_default_config() {
        let tmp = TempDir::new().unwrap();
        let config = BlobShardConfig::default_config(tmp.path());
        config
            .save(&BlobShardConfig::default_path(tmp.path()))
            .unwrap();
        let (_, store) = open_store(tmp.path()).unwrap();
        assert_eq!(store.container(), "elasticsearch-snapshots");
        assert!(store.accounts().is_empty());
    }

    #[test]
    fn open_store_without_config_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(open_store(tmp.path()).is_err());
    }
}
