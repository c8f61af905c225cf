use crate::error::{BlobShardError, Result};
use crate::router::AccountPool;
use crate::types::{LocationMode, RoutingHash, StorageType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Container used when a repository does not name one.
pub const DEFAULT_CONTAINER: &str = "elasticsearch-snapshots";

/// Top-level blobshard configuration stored as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobShardConfig {
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub storage: Vec<StorageAccountConfig>,
}

/// Raw repository settings, validated by [`StoreSettings::from_repository`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Repository name, used in log lines.
    #[serde(default = "default_repository_name")]
    pub name: String,
    /// Target container. Falls back to [`DEFAULT_CONTAINER`].
    #[serde(default)]
    pub container: Option<String>,
    /// Comma-separated account names to shard across. Empty means the
    /// default storage account.
    #[serde(default)]
    pub accounts: Option<String>,
    /// One of `primary_only`, `primary_then_secondary`, `secondary_only`,
    /// `secondary_then_primary`.
    #[serde(default)]
    pub location_mode: Option<String>,
    /// `char_sum` (default) or `fnv1a`.
    #[serde(default)]
    pub routing_hash: Option<String>,
    /// Blob path used by CLI blob commands.
    #[serde(default)]
    pub base_path: Option<String>,
}

/// One storage account known to the storage client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageAccountConfig {
    /// Name the repository's `accounts` list refers to.
    pub name: String,
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Azure storage account name. Defaults to `name`.
    #[serde(default)]
    pub account: Option<String>,
    /// Azure access key.
    #[serde(default)]
    pub access_key: Option<String>,
    /// Azure endpoint suffix, e.g. `core.windows.net`.
    #[serde(default)]
    pub endpoint_suffix: Option<String>,
    /// Root directory for local accounts.
    #[serde(default)]
    pub path: Option<String>,
    /// Account used when an operation names no account.
    #[serde(default)]
    pub default: bool,
}

impl StorageAccountConfig {
    /// Azure account name, falling back to the logical name.
    pub fn account_name(&self) -> &str {
        self.account.as_deref().unwrap_or(&self.name)
    }
}

fn default_repository_name() -> String {
    "default".to_string()
}

/// Validated, immutable settings of one sharded store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub repository: String,
    pub container: String,
    pub accounts: AccountPool,
    pub location_mode: LocationMode,
}

impl StoreSettings {
    /// Validate repository settings. Fails on an unknown location mode or routing hash.
    pub fn from_repository(repo: &RepositoryConfig) -> Result<Self> {
        let location_mode = match repo.location_mode.as_deref() {
            Some(mode) => mode.parse()?,
            None => LocationMode::default(),
        };
        let hash = match repo.routing_hash.as_deref() {
            Some(hash) => hash.parse()?,
            None => RoutingHash::default(),
        };
        let container = repo
            .container
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CONTAINER)
            .to_string();

        Ok(Self {
            repository: repo.name.clone(),
            container,
            accounts: AccountPool::parse(repo.accounts.as_deref(), hash),
            location_mode,
        })
    }
}

impl BlobShardConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BlobShardError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| BlobShardError::TomlDe(e.to_string()))
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| BlobShardError::TomlSer(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validated settings for the configured repository.
    pub fn store_settings(&self) -> Result<StoreSettings> {
        let settings = StoreSettings::from_repository(&self.repository)?;
        for account in settings.accounts.accounts() {
            if !self.storage.iter().any(|s| &s.name == account) {
                return Err(BlobShardError::Config(format!(
                    "repository account '{account}' has no [[storage]] entry"
                )));
            }
        }
        Ok(settings)
    }

    /// Default config for `blobshard init`: one local account under `base_dir`.
    pub fn default_config(base_dir: &Path) -> Self {
        Self {
            repository: RepositoryConfig {
                name: default_repository_name(),
                container: Some(DEFAULT_CONTAINER.to_string()),
                accounts: None,
                location_mode: None,
                routing_hash: None,
                base_path: None,
            },
            storage: vec![StorageAccountConfig {
                name: "local".to_string(),
                storage_type: StorageType::Local,
                account: None,
                access_key: None,
                endpoint_suffix: None,
                path: Some(base_dir.join("data").display().to_string()),
                default: true,
            }],
        }
    }

    /// Resolve the config file path: `<base_dir>/blobshard.toml`
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join("blobshard.toml")
    }

    /// Resolve the default blobshard home directory: `~/.blobshard`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".blobshard"))
            .ok_or_else(|| BlobShardError::Config("Cannot determine home directory".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> RepositoryConfig {
        RepositoryConfig {
            name: "backups".to_string(),
            container: None,
            accounts: None,
            location_mode: None,
            routing_hash: None,
            base_path: None,
        }
    }

    #[test]
    fn roundtrip_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blobshard.toml");
        let config = BlobShardConfig::default_config(tmp.path());
        config.save(&path).unwrap();
        let loaded = BlobShardConfig::load(&path).unwrap();
        assert_eq!(loaded.repository.container.as_deref(), Some(DEFAULT_CONTAINER));
        assert_eq!(loaded.storage.len(), 1);
        assert_eq!(loaded.storage[0].storage_type, StorageType::Local);
        assert!(loaded.storage[0].default);
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let result = BlobShardConfig::load(Path::new("/nonexistent/blobshard.toml"));
        assert!(matches!(result, Err(BlobShardError::ConfigNotFound(_))));
    }

    #[test]
    fn defaults_apply() {
        let settings = StoreSettings::from_repository(&repo()).unwrap();
        assert_eq!(settings.container, DEFAULT_CONTAINER);
        assert_eq!(settings.location_mode, LocationMode::PrimaryOnly);
        assert!(settings.accounts.is_empty());
        assert_eq!(settings.accounts.hash(), RoutingHash::CharSum);
    }

    #[test]
    fn explicit_settings_parse() {
        let mut r = repo();
        r.container = Some("snaps".to_string());
        r.accounts = Some("east, west".to_string());
        r.location_mode = Some("primary_then_secondary".to_string());
        r.routing_hash = Some("fnv1a".to_string());
        let settings = StoreSettings::from_repository(&r).unwrap();
        assert_eq!(settings.container, "snaps");
        assert_eq!(settings.accounts.accounts(), &["east", "west"]);
        assert_eq!(settings.location_mode, LocationMode::PrimaryThenSecondary);
        assert_eq!(settings.accounts.hash(), RoutingHash::Fnv1a);
    }

    #[test]
    fn invalid_location_mode_fails_fast() {
        let mut r = repo();
        r.location_mode = Some("closest".to_string());
        let err = StoreSettings::from_repository(&r).unwrap_err();
        assert!(matches!(err, BlobShardError::InvalidLocationMode(m) if m == "closest"));
    }

    #[test]
    fn parse_toml_with_accounts() {
        let toml = r#"
            [repository]
            name = "backups"
            container = "snapshots"
            accounts = "east,west"
            location_mode = "secondary_only"

            [[storage]]
            name = "east"
            type = "azure"
            account = "eaststore"
            access_key = "a2V5"
            default = true

            [[storage]]
            name = "west"
            type = "azure"
        "#;
        let config: BlobShardConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.storage[0].account_name(), "eaststore");
        assert_eq!(config.storage[1].account_name(), "west");
        let settings = config.store_settings().unwrap();
        assert_eq!(settings.repository, "backups");
        assert_eq!(settings.location_mode, LocationMode::SecondaryOnly);
        assert_eq!(settings.accounts.len(), 2);
    }

    #[test]
    fn unknown_repository_account_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut config = BlobShardConfig::default_config(tmp.path());
        config.repository.accounts = Some("local,missing".to_string());
        let err = config.store_settings().unwrap_err();
        assert!(matches!(err, BlobShardError::Config(m) if m.contains("missing")));
    }
}
