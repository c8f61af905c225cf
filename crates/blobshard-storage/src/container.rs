use blobshard_core::error::Result;
use blobshard_core::path::BlobPath;
use bytes::Bytes;
use futures::TryStreamExt;

use crate::client::{BlobListing, BlobSink, ByteStream};
use crate::store::ShardedBlobStore;

/// Blobs under one path of a [`ShardedBlobStore`].
///
/// Blob names are relative to the path; the full key is
/// `path.as_key_prefix() + name`, and that full key decides the account.
#[derive(Clone)]
pub struct ShardedBlobContainer {
    store: ShardedBlobStore,
    path: BlobPath,
    key_path: String,
}

impl ShardedBlobContainer {
    pub(crate) fn new(store: ShardedBlobStore, path: BlobPath) -> Self {
        let key_path = path.as_key_prefix();
        Self {
            store,
            path,
            key_path,
        }
    }

    pub fn path(&self) -> &BlobPath {
        &self.path
    }

    /// Full blob key for `name`.
    pub fn key(&self, name: &str) -> String {
        format!("{}{name}", self.key_path)
    }

    pub async fn blob_exists(&self, name: &str) -> Result<bool> {
        self.store
            .blob_exists(self.store.container(), &self.key(name))
            .await
    }

    pub async fn delete_blob(&self, name: &str) -> Result<()> {
        self.store
            .delete_blob(self.store.container(), &self.key(name))
            .await
    }

    pub async fn read_blob(&self, name: &str) -> Result<ByteStream> {
        self.store
            .open_read(self.store.container(), &self.key(name))
            .await
    }

    /// Read the whole blob into memory.
    pub async fn read_blob_to_vec(&self, name: &str) -> Result<Vec<u8>> {
        let chunks: Vec<Bytes> = self.read_blob(name).await?.try_collect().await?;
        Ok(chunks.concat())
    }

    pub async fn write_blob(&self, name: &str) -> Result<Box<dyn BlobSink>> {
        self.store
            .open_write(self.store.container(), &self.key(name))
            .await
    }

    /// Write `data` as a complete blob.
    pub async fn write_blob_bytes(&self, name: &str, data: Bytes) -> Result<()> {
        let mut sink = self.write_blob(name).await?;
        sink.write(data).await?;
        sink.finish().await
    }

    /// All blobs directly under this path.
    pub async fn list_blobs(&self) -> Result<BlobListing> {
        self.list_blobs_by_prefix("").await
    }

    pub async fn list_blobs_by_prefix(&self, prefix: &str) -> Result<BlobListing> {
        self.store
            .list_blobs_by_prefix(self.store.container(), &self.key_path, prefix)
            .await
    }
}
