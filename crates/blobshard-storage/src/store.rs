use std::sync::Arc;

use blobshard_core::config::StoreSettings;
use blobshard_core::error::Result;
use blobshard_core::path::BlobPath;
use blobshard_core::router::AccountPool;
use blobshard_core::types::LocationMode;
use tracing::{debug, warn};

use crate::client::{BlobListing, BlobSink, ByteStream, StorageClient};
use crate::container::ShardedBlobContainer;

/// Blob store sharded across a pool of storage accounts.
///
/// Per-blob operations go to the single account that owns the key.
/// Container-wide operations fan out to every account, one at a time, in
/// pool order. Settings are fixed at construction, so one instance can be
/// shared by any number of callers.
#[derive(Clone)]
pub struct ShardedBlobStore {
    client: Arc<dyn StorageClient>,
    settings: StoreSettings,
}

impl ShardedBlobStore {
    pub fn new(settings: StoreSettings, client: Arc<dyn StorageClient>) -> Self {
        debug!(
            repository = %settings.repository,
            container = %settings.container,
            accounts = ?settings.accounts.accounts(),
            mode = %settings.location_mode,
            client = client.name(),
            "opened sharded blob store"
        );
        Self { client, settings }
    }

    /// Container name every operation of this store targets by default.
    pub fn container(&self) -> &str {
        &self.settings.container
    }

    pub fn accounts(&self) -> &AccountPool {
        &self.settings.accounts
    }

    pub fn location_mode(&self) -> LocationMode {
        self.settings.location_mode
    }

    /// Account owning `key`; `None` is the client's default account.
    pub fn resolve_account(&self, key: &str) -> Option<&str> {
        self.settings.accounts.resolve(key)
    }

    /// Handle over the blobs stored under `path`.
    pub fn blob_container(&self, path: BlobPath) -> ShardedBlobContainer {
        ShardedBlobContainer::new(self.clone(), path)
    }

    /// Best-effort recursive delete of everything under `path`.
    ///
    /// Errors are logged and dropped.
    pub async fn delete(&self, path: &BlobPath) {
        let prefix = path.as_key_prefix();
        if let Err(e) = self.delete_files(&self.settings.container, &prefix).await {
            warn!(
                prefix = %prefix,
                container = %self.settings.container,
                error = %e,
                "can not remove blobs under prefix"
            );
        }
    }

    /// True only if `container` exists in every account. Stops at the first
    /// account without it.
    pub async fn container_exists(&self, container: &str) -> Result<bool> {
        for account in self.settings.accounts.fan_out() {
            if !self
                .client
                .container_exists(account, self.settings.location_mode, container)
                .await?
            {
                debug!(container, account = ?account, "container missing");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Create `container` in every account. Stops at the first error.
    pub async fn create_container(&self, container: &str) -> Result<()> {
        for account in self.settings.accounts.fan_out() {
            debug!(container, account = ?account, "creating container");
            self.client
                .create_container(account, self.settings.location_mode, container)
                .await?;
        }
        Ok(())
    }

    /// Remove `container` from every account. Stops at the first error.
    pub async fn remove_container(&self, container: &str) -> Result<()> {
        for account in self.settings.accounts.fan_out() {
            debug!(container, account = ?account, "removing container");
            self.client
                .remove_container(account, self.settings.location_mode, container)
                .await?;
        }
        Ok(())
    }

    /// Delete every blob under `prefix` in every account. Stops at the first error.
    pub async fn delete_files(&self, container: &str, prefix: &str) -> Result<()> {
        for account in self.settings.accounts.fan_out() {
            debug!(container, prefix, account = ?account, "deleting blobs by prefix");
            self.client
                .delete_by_prefix(account, self.settings.location_mode, container, prefix)
                .await?;
        }
        Ok(())
    }

    pub async fn blob_exists(&self, container: &str, key: &str) -> Result<bool> {
        let account = self.resolve_account(key);
        debug!(container, key, account = ?account, "blob exists");
        self.client
            .blob_exists(account, self.settings.location_mode, container, key)
            .await
    }

    pub async fn delete_blob(&self, container: &str, key: &str) -> Result<()> {
        let account = self.resolve_account(key);
        debug!(container, key, account = ?account, "delete blob");
        self.client
            .delete_blob(account, self.settings.location_mode, container, key)
            .await
    }

    pub async fn open_read(&self, container: &str, key: &str) -> Result<ByteStream> {
        let account = self.resolve_account(key);
        debug!(container, key, account = ?account, "open blob for read");
        self.client
            .open_read(account, self.settings.location_mode, container, key)
            .await
    }

    pub async fn open_write(&self, container: &str, key: &str) -> Result<Box<dyn BlobSink>> {
        let account = self.resolve_account(key);
        debug!(container, key, account = ?account, "open blob for write");
        self.client
            .open_write(account, self.settings.location_mode, container, key)
            .await
    }

    /// Merge the listings of every account. When two accounts hold the same
    /// name, the later account in pool order wins.
    pub async fn list_blobs_by_prefix(
        &self,
        container: &str,
        key_path: &str,
        prefix: &str,
    ) -> Result<BlobListing> {
        let mut merged = BlobListing::new();
        for account in self.settings.accounts.fan_out() {
            let blobs = self
                .client
                .list_by_prefix(
                    account,
                    self.settings.location_mode,
                    container,
                    key_path,
                    prefix,
                )
                .await?;
            merged.extend(blobs);
        }
        Ok(merged)
    }
}

impl std::fmt::Display for ShardedBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.settings.container)
    }
}
