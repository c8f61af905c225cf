use anyhow::Result;
use std::path::Path;

use super::store::open_container;

pub async fn exists(base_dir: &Path, name: &str, path: Option<&str>) -> Result<()> {
    let (_, container) = open_container(base_dir, path)?;
    let key = container.key(name);
    if container.blob_exists(name).await? {
        println!("{key} exists");
    } else {
        println!("{key} not found");
        std::process::exit(1);
    }
    Ok(())
}

pub async fn rm(base_dir: &Path, name: &str, path: Option<&str>) -> Result<()> {
    let (_, container) = open_container(base_dir, path)?;
    container.delete_blob(name).await?;
    println!("Deleted {}", container.key(name));
    Ok(())
}
