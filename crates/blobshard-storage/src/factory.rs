//! Factory for creating the storage client described by configuration.

use std::path::PathBuf;
use std::sync::Arc;

use blobshard_core::config::StorageAccountConfig;
use blobshard_core::error::{BlobShardError, Result};
use blobshard_core::types::StorageType;

use crate::client::StorageClient;
use crate::local::{LocalAccount, LocalStorageClient};

/// Create a StorageClient over every configured `[[storage]]` account.
///
/// All accounts must share one type:
/// - `local`: one directory per account (requires `path`)
/// - `azure`: Azure Blob Storage (requires `access_key`, compile with `azure` feature)
pub fn create_storage_client(accounts: &[StorageAccountConfig]) -> Result<Arc<dyn StorageClient>> {
    let first = accounts
        .first()
        .ok_or_else(|| BlobShardError::Config("no [[storage]] accounts configured".to_string()))?;
    if let Some(other) = accounts.iter().find(|a| a.storage_type != first.storage_type) {
        return Err(BlobShardError::Config(format!(
            "storage accounts must share one type: '{}' is {}, '{}' is {}",
            first.name, first.storage_type, other.name, other.storage_type
        )));
    }

    match first.storage_type {
        StorageType::Local => {
            let locals = accounts
                .iter()
                .map(|a| {
                    let path = a.path.as_deref().ok_or_else(|| {
                        BlobShardError::Config(format!(
                            "local storage account '{}' requires 'path'",
                            a.name
                        ))
                    })?;
                    Ok(LocalAccount {
                        name: a.name.clone(),
                        path: PathBuf::from(path),
                        default: a.default,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Arc::new(LocalStorageClient::new(locals, "local")?))
        }

        #[cfg(feature = "azure")]
        StorageType::Azure => Ok(Arc::new(crate::azure::AzureStorageClient::new(
            accounts, "azure",
        )?)),

        #[cfg(not(feature = "azure"))]
        StorageType::Azure => Err(BlobShardError::Config(
            "azure feature not enabled. Recompile with --features azure".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn local(name: &str, path: Option<PathBuf>) -> StorageAccountConfig {
        StorageAccountConfig {
            name: name.to_string(),
            storage_type: StorageType::Local,
            account: None,
            access_key: None,
            endpoint_suffix: None,
            path: path.map(|p| p.display().to_string()),
            default: false,
        }
    }

    #[test]
    fn builds_local_client() {
        let tmp = TempDir::new().unwrap();
        let client = create_storage_client(&[
            local("east", Some(tmp.path().join("east"))),
            local("west", Some(tmp.path().join("west"))),
        ])
        .unwrap();
        assert_eq!(client.name(), "local");
        assert!(tmp.path().join("west").is_dir());
    }

    #[test]
    fn empty_config_rejected() {
        assert!(matches!(
            create_storage_client(&[]),
            Err(BlobShardError::Config(_))
        ));
    }

    #[test]
    fn local_without_path_rejected() {
        let err = create_storage_client(&[local("east", None)]).err().unwrap();
        assert!(matches!(err, BlobShardError::Config(m) if m.contains("path")));
    }

    #[test]
    fn mixed_types_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut azure = local("cloud", None);
        azure.storage_type = StorageType::Azure;
        let err = create_storage_client(&[local("disk", Some(tmp.path().to_path_buf())), azure])
            .err()
            .unwrap();
        assert!(matches!(err, BlobShardError::Config(m) if m.contains("share one type")));
    }

    #[cfg(feature = "azure")]
    #[test]
    fn azure_without_key_rejected() {
        let mut azure = local("cloud", None);
        azure.storage_type = StorageType::Azure;
        let err = create_storage_client(&[azure]).err().unwrap();
        assert!(matches!(err, BlobShardError::Config(m) if m.contains("access_key")));
    }
}
