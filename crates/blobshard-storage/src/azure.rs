#[cfg(feature = "azure")]
mod inner {
    use std::collections::HashMap;
    use std::future::Future;

    use async_trait::async_trait;
    use azure_core::{Body, StatusCode, Url};
    use azure_storage::{CloudLocation, StorageCredentials};
    use azure_storage_blobs::prelude::*;
    use blobshard_core::config::StorageAccountConfig;
    use blobshard_core::error::{BlobShardError, Result};
    use blobshard_core::types::{BlobMetadata, Location, LocationMode, StorageType};
    use bytes::{Bytes, BytesMut};
    use futures::StreamExt;
    use tracing::{debug, warn};

    use crate::client::{BlobListing, BlobSink, ByteStream, StorageClient, pick_default_account};

    const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";
    /// Size of each staged block in `open_write`.
    pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

    /// Primary and read-access secondary endpoints of one storage account.
    #[derive(Clone)]
    struct AccountClients {
        primary: BlobServiceClient,
        secondary: BlobServiceClient,
    }

    impl AccountClients {
        fn at(&self, location: Location) -> &BlobServiceClient {
            match location {
                Location::Primary => &self.primary,
                Location::Secondary => &self.secondary,
            }
        }
    }

    /// Azure Blob Storage client over one or more storage accounts.
    pub struct AzureStorageClient {
        accounts: HashMap<String, AccountClients>,
        default_account: String,
        name: String,
    }

    fn service_error(e: azure_core::Error) -> BlobShardError {
        BlobShardError::Service(e.to_string())
    }

    fn is_status(e: &azure_core::Error, status: StatusCode) -> bool {
        e.as_http_error().is_some_and(|h| h.status() == status)
    }

    fn blob_error(e: azure_core::Error, key: &str) -> BlobShardError {
        if is_status(&e, StatusCode::NotFound) {
            BlobShardError::BlobNotFound(key.to_string())
        } else {
            service_error(e)
        }
    }

    fn endpoint(account: &str, suffix: &str, secondary: bool) -> Result<String> {
        let host = if secondary {
            format!("https://{account}-secondary.blob.{suffix}")
        } else {
            format!("https://{account}.blob.{suffix}")
        };
        Url::parse(&host).map_err(|e| BlobShardError::Address(format!("{host}: {e}")))?;
        Ok(host)
    }

    impl AzureStorageClient {
        /// Create from `[[storage]]` entries of type `azure`.
        pub fn new(accounts: &[StorageAccountConfig], name: &str) -> Result<Self> {
            let default_account =
                pick_default_account(accounts.iter().map(|a| (a.name.as_str(), a.default)))?;

            let mut clients = HashMap::new();
            for cfg in accounts {
                if cfg.storage_type != StorageType::Azure {
                    return Err(BlobShardError::Config(format!(
                        "storage account '{}' is {}, expected azure",
                        cfg.name, cfg.storage_type
                    )));
                }
                let key = cfg.access_key.as_deref().ok_or_else(|| {
                    BlobShardError::Config(format!(
                        "azure storage account '{}' requires 'access_key'",
                        cfg.name
                    ))
                })?;
                let account = cfg.account_name();
                let suffix = cfg
                    .endpoint_suffix
                    .as_deref()
                    .unwrap_or(DEFAULT_ENDPOINT_SUFFIX);

                let build = |secondary: bool| -> Result<BlobServiceClient> {
                    let credentials = StorageCredentials::access_key(account, key.to_string());
                    let location = CloudLocation::Custom {
                        account: account.to_string(),
                        uri: endpoint(account, suffix, secondary)?,
                    };
                    Ok(ClientBuilder::with_location(location, credentials).blob_service_client())
                };
                clients.insert(
                    cfg.name.clone(),
                    AccountClients {
                        primary: build(false)?,
                        secondary: build(true)?,
                    },
                );
            }

            Ok(Self {
                accounts: clients,
                default_account,
                name: name.to_string(),
            })
        }

        fn clients(&self, account: Option<&str>) -> Result<&AccountClients> {
            let name = account.unwrap_or(&self.default_account);
            self.accounts
                .get(name)
                .ok_or_else(|| BlobShardError::Address(format!("unknown storage account [{name}]")))
        }

        fn writer(&self, account: Option<&str>, mode: LocationMode) -> Result<&BlobServiceClient> {
            let location = mode.write_target().ok_or_else(|| {
                BlobShardError::Service(format!(
                    "location mode {mode} cannot serve writes, the secondary location is read-only"
                ))
            })?;
            Ok(self.clients(account)?.at(location))
        }

        /// Run a read against each location of `mode` in turn. Returns the
        /// first success, or the last error.
        async fn read_from<T, F, Fut>(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            op: F,
        ) -> Result<T>
        where
            F: Fn(BlobServiceClient) -> Fut + Send,
            Fut: Future<Output = azure_core::Result<T>> + Send,
            T: Send,
        {
            let clients = self.clients(account)?;
            let mut last_err = None;
            for &location in mode.read_targets() {
                match op(clients.at(location).clone()).await {
                    Ok(v) => return Ok(v),
                    Err(e) => {
                        debug!(%location, error = %e, "azure read failed");
                        last_err = Some(e);
                    }
                }
            }
            Err(last_err.map(service_error).unwrap_or_else(|| {
                BlobShardError::Service(format!("location mode {mode} has no read location"))
            }))
        }
    }

    #[async_trait]
    impl StorageClient for AzureStorageClient {
        async fn blob_exists(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            container: &str,
            key: &str,
        ) -> Result<bool> {
            self.read_from(account, mode, |svc| {
                let blob = svc.container_client(container).blob_client(key);
                async move { blob.exists().await }
            })
            .await
        }

        async fn delete_blob(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            container: &str,
            key: &str,
        ) -> Result<()> {
            self.writer(account, mode)?
                .container_client(container)
                .blob_client(key)
                .delete()
                .await
                .map_err(|e| blob_error(e, key))?;
            Ok(())
        }

        async fn open_read(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            container: &str,
            key: &str,
        ) -> Result<ByteStream> {
            // Pick the first location that can see the blob, then stream from it.
            let clients = self.clients(account)?;
            let mut found = None;
            let mut last_err = None;
            for &location in mode.read_targets() {
                let blob = clients.at(location).container_client(container).blob_client(key);
                match blob.get_properties().await {
                    Ok(_) => {
                        found = Some(blob);
                        break;
                    }
                    Err(e) => {
                        debug!(%location, key, error = %e, "azure blob lookup failed");
                        last_err = Some(e);
                    }
                }
            }
            let blob = match (found, last_err) {
                (Some(blob), _) => blob,
                (None, Some(e)) => return Err(blob_error(e, key)),
                (None, None) => return Err(BlobShardError::BlobNotFound(key.to_string())),
            };

            let stream = blob.get().into_stream().then(|page| async move {
                match page {
                    Ok(response) => response.data.collect().await.map_err(service_error),
                    Err(e) => Err(service_error(e)),
                }
            });
            Ok(stream.boxed())
        }

        async fn open_write(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            container: &str,
            key: &str,
        ) -> Result<Box<dyn BlobSink>> {
            let blob = self.writer(account, mode)?.container_client(container).blob_client(key);
            Ok(Box::new(AzureBlobSink {
                blob,
                key: key.to_string(),
                buffer: BytesMut::new(),
                block_ids: Vec::new(),
                committed: false,
            }))
        }

        async fn delete_by_prefix(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            container: &str,
            prefix: &str,
        ) -> Result<()> {
            let container_client = self.writer(account, mode)?.container_client(container);
            let names = list_names(&container_client, prefix, false)
                .await
                .map_err(service_error)?;
            for (name, _) in names {
                debug!(container, blob = %name, "deleting blob");
                container_client
                    .blob_client(&name)
                    .delete()
                    .await
                    .map_err(|e| blob_error(e, &name))?;
            }
            Ok(())
        }

        async fn container_exists(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            container: &str,
        ) -> Result<bool> {
            // Unknown accounts are an addressing error, not a missing container.
            self.clients(account)?;
            let exists = self
                .read_from(account, mode, |svc| {
                    let client = svc.container_client(container);
                    async move { client.exists().await }
                })
                .await;
            match exists {
                Ok(exists) => Ok(exists),
                Err(e @ BlobShardError::Service(_)) => {
                    warn!(container, error = %e, "can not access container");
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        }

        async fn create_container(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            container: &str,
        ) -> Result<()> {
            match self.writer(account, mode)?.container_client(container).create().await {
                Ok(_) => Ok(()),
                Err(e) if is_status(&e, StatusCode::Conflict) => {
                    debug!(container, "container already exists");
                    Ok(())
                }
                Err(e) => Err(service_error(e)),
            }
        }

        async fn remove_container(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            container: &str,
        ) -> Result<()> {
            match self.writer(account, mode)?.container_client(container).delete().await {
                Ok(_) => Ok(()),
                Err(e) if is_status(&e, StatusCode::NotFound) => Ok(()),
                Err(e) => Err(service_error(e)),
            }
        }

        async fn list_by_prefix(
            &self,
            account: Option<&str>,
            mode: LocationMode,
            container: &str,
            key_path: &str,
            prefix: &str,
        ) -> Result<BlobListing> {
            let full_prefix = format!("{key_path}{prefix}");
            let names = self
                .read_from(account, mode, |svc| {
                    let client = svc.container_client(container);
                    let full_prefix = full_prefix.clone();
                    async move { list_names(&client, &full_prefix, true).await }
                })
                .await?;

            Ok(names
                .into_iter()
                .filter_map(|(full, length)| {
                    let name = full.strip_prefix(key_path)?.to_string();
                    // Only direct children of key_path.
                    (!name.contains('/')).then(|| (name.clone(), BlobMetadata::new(name, length)))
                })
                .collect())
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    /// `(name, length)` of the blobs under `prefix`. With `direct_only`, the
    /// service groups deeper names into virtual directories, which are skipped.
    async fn list_names(
        client: &ContainerClient,
        prefix: &str,
        direct_only: bool,
    ) -> azure_core::Result<Vec<(String, u64)>> {
        let mut builder = client.list_blobs();
        if !prefix.is_empty() {
            builder = builder.prefix(prefix.to_string());
        }
        if direct_only {
            builder = builder.delimiter("/");
        }
        let mut stream = builder.into_stream();
        let mut names = Vec::new();
        while let Some(page) = stream.next().await {
            for blob in page?.blobs.blobs() {
                names.push((blob.name.clone(), blob.properties.content_length));
            }
        }
        Ok(names)
    }

    /// Stages 4 MiB blocks and commits them as a block list on `finish`.
    struct AzureBlobSink {
        blob: BlobClient,
        key: String,
        buffer: BytesMut,
        block_ids: Vec<String>,
        committed: bool,
    }

    impl AzureBlobSink {
        async fn put_block(&mut self, block: Bytes) -> Result<()> {
            let block_id = format!("{:032}", self.block_ids.len());
            self.blob
                .put_block(block_id.clone(), Body::from(block))
                .await
                .map_err(service_error)?;
            self.block_ids.push(block_id);
            Ok(())
        }

        fn check_open(&self) -> Result<()> {
            if self.committed {
                return Err(BlobShardError::Service(format!(
                    "blob [{}] already committed",
                    self.key
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BlobSink for AzureBlobSink {
        async fn write(&mut self, chunk: Bytes) -> Result<()> {
            self.check_open()?;
            self.buffer.extend_from_slice(&chunk);
            while self.buffer.len() >= BLOCK_SIZE {
                let block = self.buffer.split_to(BLOCK_SIZE).freeze();
                self.put_block(block).await?;
            }
            Ok(())
        }

        async fn finish(&mut self) -> Result<()> {
            self.check_open()?;
            if !self.buffer.is_empty() {
                let block = self.buffer.split().freeze();
                self.put_block(block).await?;
            }
            let block_list = BlockList {
                blocks: self
                    .block_ids
                    .iter()
                    .map(|id| BlobBlockType::Latest(BlockId::from(id.clone())))
                    .collect(),
            };
            self.blob
                .put_block_list(block_list)
                .await
                .map_err(service_error)?;
            self.committed = true;
            debug!(key = %self.key, blocks = self.block_ids.len(), "committed blob");
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn account(name: &str, key: Option<&str>, default: bool) -> StorageAccountConfig {
            StorageAccountConfig {
                name: name.to_string(),
                storage_type: StorageType::Azure,
                account: None,
                access_key: key.map(str::to_string),
                endpoint_suffix: None,
                path: None,
                default,
            }
        }

        // Base64 of "test-key", the form Azure access keys take.
        const KEY: &str = "dGVzdC1rZXk=";

        #[test]
        fn endpoints_for_both_locations() {
            assert_eq!(
                endpoint("snaps1", DEFAULT_ENDPOINT_SUFFIX, false).unwrap(),
                "https://snaps1.blob.core.windows.net"
            );
            assert_eq!(
                endpoint("snaps1", "core.chinacloudapi.cn", true).unwrap(),
                "https://snaps1-secondary.blob.core.chinacloudapi.cn"
            );
        }

        #[test]
        fn malformed_endpoint_is_address_error() {
            let err = endpoint("snaps1", "core windows net", false).unwrap_err();
            assert!(matches!(err, BlobShardError::Address(_)), "{err}");
        }

        #[test]
        fn new_builds_every_account() {
            let mut second = account("west", Some(KEY), true);
            second.account = Some("westsnaps".to_string());
            let client =
                AzureStorageClient::new(&[account("east", Some(KEY), false), second], "azure")
                    .unwrap();
            assert_eq!(client.name, "azure");
            assert_eq!(client.default_account, "west");
            assert!(client.clients(Some("east")).is_ok());
            assert!(client.clients(None).is_ok());
            assert!(matches!(
                client.clients(Some("north")),
                Err(BlobShardError::Address(_))
            ));
        }

        #[test]
        fn new_requires_access_key() {
            let err = AzureStorageClient::new(&[account("east", None, false)], "azure")
                .err()
                .unwrap();
            match err {
                BlobShardError::Config(msg) => assert!(msg.contains("access_key"), "{msg}"),
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn new_rejects_two_defaults() {
            let accounts = [account("east", Some(KEY), true), account("west", Some(KEY), true)];
            let err = AzureStorageClient::new(&accounts, "azure").err().unwrap();
            assert!(matches!(err, BlobShardError::Config(_)), "{err}");
        }

        #[test]
        fn new_rejects_local_accounts() {
            let mut local = account("disk", None, false);
            local.storage_type = StorageType::Local;
            local.path = Some("/tmp/blobshard".to_string());
            let err = AzureStorageClient::new(&[local], "azure").err().unwrap();
            assert!(matches!(err, BlobShardError::Config(_)), "{err}");
        }

        #[tokio::test]
        async fn unknown_account_is_not_a_missing_container() {
            let client =
                AzureStorageClient::new(&[account("east", Some(KEY), false)], "azure").unwrap();
            let err = client
                .container_exists(Some("north"), LocationMode::PrimaryOnly, "snaps")
                .await
                .unwrap_err();
            assert!(matches!(err, BlobShardError::Address(_)), "{err}");
        }
    }
}

#[cfg(feature = "azure")]
pub use inner::{AzureStorageClient, BLOCK_SIZE};
