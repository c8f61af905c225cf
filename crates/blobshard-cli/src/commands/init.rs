use anyhow::Result;
use std::path::Path;

use blobshard_core::config::BlobShardConfig;

use super::store::open_store;

pub async fn run(base_dir: &Path) -> Result<()> {
    println!("Initializing blobshard in {}", base_dir.display());

    std::fs::create_dir_all(base_dir)?;

    let config_path = BlobShardConfig::default_path(base_dir);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        let config = BlobShardConfig::default_config(base_dir);
        config.save(&config_path)?;
        println!("Created config: {}", config_path.display());
    }

    // Validates the config and connects every account.
    let (_, store) = open_store(base_dir)?;
    let container = store.container().to_string();
    if store.container_exists(&container).await? {
        println!("Container '{container}' already exists");
    } else {
        store.create_container(&container).await?;
        tracing::info!(container = %container, accounts = store.accounts().len(), "container created");
        println!("Created container '{container}'");
    }

    println!("\nblobshard initialized. Next steps:");
    println!("  1. Add storage accounts to {}", config_path.display());
    println!("  2. Run `blobshard put <name> <file>` to store your first blob");

    Ok(())
}
