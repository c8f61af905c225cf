use async_trait::async_trait;
use blobshard_core::error::{BlobShardError, Result};
use blobshard_core::types::{BlobMetadata, LocationMode};
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::client::{BlobListing, BlobSink, ByteStream, StorageClient, pick_default_account};

const READ_CHUNK_SIZE: usize = 64 * 1024;
const STAGING_DIR: &str = ".staging";

/// One filesystem-backed account.
#[derive(Debug, Clone)]
pub struct LocalAccount {
    pub name: String,
    pub path: PathBuf,
    pub default: bool,
}

/// Filesystem-based storage client for local testing.
///
/// Layout: `<account root>/<container>/<key>`. Primary and secondary
/// locations share the same directory.
pub struct LocalStorageClient {
    accounts: HashMap<String, PathBuf>,
    default_account: String,
    name: String,
}

impl LocalStorageClient {
    pub fn new(accounts: Vec<LocalAccount>, name: &str) -> Result<Self> {
        let default_account =
            pick_default_account(accounts.iter().map(|a| (a.name.as_str(), a.default)))?;

        let mut roots = HashMap::new();
        for account in accounts {
            std::fs::create_dir_all(&account.path)?;
            roots.insert(account.name, account.path);
        }

        Ok(Self {
            accounts: roots,
            default_account,
            name: name.to_string(),
        })
    }

    /// A client with a single default account rooted at `path`.
    pub fn single(path: &Path, name: &str) -> Result<Self> {
        Self::new(
            vec![LocalAccount {
                name: "default".to_string(),
                path: path.to_path_buf(),
                default: true,
            }],
            name,
        )
    }

    pub fn default_account(&self) -> &str {
        &self.default_account
    }

    fn account_root(&self, account: Option<&str>) -> Result<&Path> {
        let name = account.unwrap_or(&self.default_account);
        self.accounts
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| BlobShardError::Address(format!("unknown storage account [{name}]")))
    }

    fn container_dir(&self, account: Option<&str>, container: &str) -> Result<PathBuf> {
        if container.is_empty()
            || container.starts_with('.')
            || container.contains(['/', '\\'])
        {
            return Err(BlobShardError::Address(format!(
                "invalid container name [{container}]"
            )));
        }
        Ok(self.account_root(account)?.join(container))
    }

    /// Container directory, which must already exist.
    fn existing_container(&self, account: Option<&str>, container: &str) -> Result<PathBuf> {
        let dir = self.container_dir(account, container)?;
        if !dir.is_dir() {
            return Err(BlobShardError::Service(format!(
                "container [{container}] does not exist"
            )));
        }
        Ok(dir)
    }

    fn blob_path(&self, account: Option<&str>, container: &str, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.container_dir(account, container)?.join(key))
    }
}

fn validate_key(key: &str) -> Result<()> {
    let bad_segment = key
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad_segment || key.contains('\\') {
        return Err(BlobShardError::Address(format!("invalid blob key [{key}]")));
    }
    Ok(())
}

fn io_error(context: &str, e: std::io::Error) -> BlobShardError {
    BlobShardError::Service(format!("{context}: {e}"))
}

fn ensure_writable(mode: LocationMode) -> Result<()> {
    if mode.write_target().is_none() {
        return Err(BlobShardError::Service(format!(
            "location mode {mode} cannot serve writes, the secondary location is read-only"
        )));
    }
    Ok(())
}

/// All blobs under `dir` as `(key, length)`, keys relative to `base`.
fn walk(dir: &Path, base: &Path, out: &mut Vec<(String, u64)>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, base, out)?;
        } else if file_type.is_file() {
            let rel = path.strip_prefix(base).unwrap_or(&path);
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push((key, entry.metadata()?.len()));
        }
    }
    Ok(())
}

/// Remove empty directories from `start` up to, not including, `stop`.
fn prune_empty_dirs(start: Option<&Path>, stop: &Path) {
    let mut current = start;
    while let Some(dir) = current {
        if dir == stop || !dir.starts_with(stop) || std::fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}

#[async_trait]
impl StorageClient for LocalStorageClient {
    async fn blob_exists(
        &self,
        account: Option<&str>,
        _mode: LocationMode,
        container: &str,
        key: &str,
    ) -> Result<bool> {
        Ok(self.blob_path(account, container, key)?.is_file())
    }

    async fn delete_blob(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
        key: &str,
    ) -> Result<()> {
        ensure_writable(mode)?;
        let path = self.blob_path(account, container, key)?;
        let dir = self.existing_container(account, container)?;
        if !path.is_file() {
            return Err(BlobShardError::BlobNotFound(key.to_string()));
        }
        std::fs::remove_file(&path).map_err(|e| io_error(key, e))?;
        prune_empty_dirs(path.parent(), &dir);
        Ok(())
    }

    async fn open_read(
        &self,
        account: Option<&str>,
        _mode: LocationMode,
        container: &str,
        key: &str,
    ) -> Result<ByteStream> {
        let path = self.blob_path(account, container, key)?;
        self.existing_container(account, container)?;
        if !path.is_file() {
            return Err(BlobShardError::BlobNotFound(key.to_string()));
        }
        let data = Bytes::from(std::fs::read(&path).map_err(|e| io_error(key, e))?);
        let chunks: Vec<Result<Bytes>> = (0..data.len())
            .step_by(READ_CHUNK_SIZE)
            .map(|offset| Ok(data.slice(offset..(offset + READ_CHUNK_SIZE).min(data.len()))))
            .collect();
        Ok(futures::stream::iter(chunks).boxed())
    }

    async fn open_write(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
        key: &str,
    ) -> Result<Box<dyn BlobSink>> {
        ensure_writable(mode)?;
        let dest = self.blob_path(account, container, key)?;
        self.existing_container(account, container)?;
        let staging = self.account_root(account)?.join(STAGING_DIR);
        std::fs::create_dir_all(&staging).map_err(|e| io_error(key, e))?;
        let file = NamedTempFile::new_in(&staging).map_err(|e| io_error(key, e))?;
        Ok(Box::new(LocalBlobSink {
            file: Some(file),
            dest,
            key: key.to_string(),
        }))
    }

    async fn delete_by_prefix(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
        prefix: &str,
    ) -> Result<()> {
        ensure_writable(mode)?;
        let dir = self.existing_container(account, container)?;
        let mut blobs = Vec::new();
        walk(&dir, &dir, &mut blobs).map_err(|e| io_error(container, e))?;
        for (key, _) in blobs.into_iter().filter(|(k, _)| k.starts_with(prefix)) {
            let path = dir.join(&key);
            std::fs::remove_file(&path).map_err(|e| io_error(&key, e))?;
            prune_empty_dirs(path.parent(), &dir);
        }
        Ok(())
    }

    async fn container_exists(
        &self,
        account: Option<&str>,
        _mode: LocationMode,
        container: &str,
    ) -> Result<bool> {
        Ok(self.container_dir(account, container)?.is_dir())
    }

    async fn create_container(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
    ) -> Result<()> {
        ensure_writable(mode)?;
        let dir = self.container_dir(account, container)?;
        std::fs::create_dir_all(&dir).map_err(|e| io_error(container, e))
    }

    async fn remove_container(
        &self,
        account: Option<&str>,
        mode: LocationMode,
        container: &str,
    ) -> Result<()> {
        ensure_writable(mode)?;
        let dir = self.container_dir(account, container)?;
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir).map_err(|e| io_error(container, e))?;
        }
        Ok(())
    }

    async fn list_by_prefix(
        &self,
        account: Option<&str>,
        _mode: LocationMode,
        container: &str,
        key_path: &str,
        prefix: &str,
    ) -> Result<BlobListing> {
        let dir = self.existing_container(account, container)?;
        let full_prefix = format!("{key_path}{prefix}");
        let mut blobs = Vec::new();
        walk(&dir, &dir, &mut blobs).map_err(|e| io_error(container, e))?;

        Ok(blobs
            .into_iter()
            .filter(|(key, _)| key.starts_with(&full_prefix))
            .filter_map(|(key, length)| {
                let name = key[key_path.len()..].to_string();
                // Only direct children of key_path.
                (!name.contains('/')).then(|| (name.clone(), BlobMetadata::new(name, length)))
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Stages writes in a temp file and moves it into place on `finish`.
struct LocalBlobSink {
    file: Option<NamedTempFile>,
    dest: PathBuf,
    key: String,
}

#[async_trait]
impl BlobSink for LocalBlobSink {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| BlobShardError::Service(format!("blob [{}] already committed", self.key)))?;
        file.write_all(&chunk).map_err(|e| io_error(&self.key, e))
    }

    async fn finish(&mut self) -> Result<()> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| BlobShardError::Service(format!("blob [{}] already committed", self.key)))?;
        file.flush().map_err(|e| io_error(&self.key, e))?;
        if let Some(parent) = self.dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(&self.key, e))?;
        }
        file.persist(&self.dest)
            .map_err(|e| io_error(&self.key, e.error))?;
        Ok(())
    }
}
