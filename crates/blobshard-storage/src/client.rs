use std::collections::BTreeMap;

use async_trait::async_trait;
use blobshard_core::error::{BlobShardError, Result};
use blobshard_core::types::{BlobMetadata, LocationMode};
use bytes::Bytes;
use futures::stream::BoxStream;

/// Blob content as a stream of byte chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Listing result keyed by blob name.
pub type BlobListing = BTreeMap<String, BlobMetadata>;

/// Write handle returned by [`StorageClient::open_write`].
///
/// Nothing is visible to readers until `finish` succeeds.
#[async_trait]
pub trait BlobSink: Send {
    /// Append a chunk to the blob.
    async fn write(&mut self, chunk: Bytes) -> Result<()>;

    /// Commit the blob.
    async fn finish(&mut self) -> Result<()>;
}

/// Storage client capability the sharded store forwards to.
///
/// `account` selects one of the client's configured accounts; `None` means
/// the client's default account.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn blob_exists(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
        key: &str,
    ) -> Result<bool>;

    async fn delete_blob(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
        key: &str,
    ) -> Result<()>;

    async fn open_read(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
        key: &str,
    ) -> Result<ByteStream>;

    async fn open_write(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
        key: &str,
    ) -> Result<Box<dyn BlobSink>>;

    /// Delete every blob whose key starts with `prefix`.
    async fn delete_by_prefix(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
        prefix: &str,
    ) -> Result<()>;

    async fn container_exists(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
    ) -> Result<bool>;

    /// Create the container if it does not exist yet.
    async fn create_container(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
    ) -> Result<()>;

    /// Remove the container if it exists.
    async fn remove_container(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
    ) -> Result<()>;

    /// List blobs under `key_path + prefix`. Returned names have `key_path` stripped.
    async fn list_by_prefix(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
        key_path: &str,
        prefix: &str,
    ) -> Result<BlobListing>;

    /// Client name for display.
    fn name(&self) -> &str;
}

/// Name of the default account: the one flagged default, else the first.
/// More than one flagged default is a configuration error.
pub(crate) fn pick_default_account<'a>(
    accounts: impl IntoIterator<Item = (&'a str, bool)>,
) -> Result<String> {
    let accounts: Vec<(&str, bool)> = accounts.into_iter().collect();
    let flagged: Vec<&str> = accounts.iter().filter(|(_, d)| *d).map(|(n, _)| *n).collect();
    match flagged.as_slice() {
        [] => accounts
            .first()
            .map(|(n, _)| n.to_string())
            .ok_or_else(|| BlobShardError::Config("no storage accounts configured".to_string())),
        [one] => Ok(one.to_string()),
        many => Err(BlobShardError::Config(format!(
            "more than one storage account marked default: {}",
            many.join(", ")
        ))),
    }
}
