use anyhow::Result;
use std::path::Path;

use super::store::open_store;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ContainerAction {
    /// Check the container exists in every account
    Exists,
    /// Create the container in every account
    Create,
    /// Remove the container from every account
    Remove,
}

pub async fn run(base_dir: &Path, action: ContainerAction, name: Option<&str>) -> Result<()> {
    let (_, store) = open_store(base_dir)?;
    let container = name.unwrap_or(store.container()).to_string();
    let shards = store.accounts().len().max(1);

    match action {
        ContainerAction::Exists => {
            if store.container_exists(&container).await? {
                println!("Container '{container}' exists in all {shards} account(s)");
            } else {
                println!("Container '{container}' is missing from at least one account");
                std::process::exit(1);
            }
        }
        ContainerAction::Create => {
            store.create_container(&container).await?;
            println!("Created container '{container}' in {shards} account(s)");
        }
        ContainerAction::Remove => {
            store.remove_container(&container).await?;
            println!("Removed container '{container}' from {shards} account(s)");
        }
    }
    Ok(())
}
