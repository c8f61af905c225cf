use anyhow::Result;
use std::path::Path;

use blobshard_core::config::BlobShardConfig;

pub fn run(base_dir: &Path) -> Result<()> {
    let config_path = BlobShardConfig::default_path(base_dir);
    let config = BlobShardConfig::load(&config_path)?;
    let settings = config.store_settings()?;

    println!("Config: {}", config_path.display());
    println!();
    println!("  Repository:     {}", settings.repository);
    println!("  Container:      {}", settings.container);
    println!("  Location mode:  {}", settings.location_mode);
    println!("  Routing hash:   {}", settings.accounts.hash());
    if let Some(ref base) = config.repository.base_path {
        println!("  Base path:      {base}");
    }
    if settings.accounts.is_empty() {
        println!("  Shards:         (default account only)");
    } else {
        println!("  Shards:         {}", settings.accounts.accounts().join(", "));
    }
    println!();

    if config.storage.is_empty() {
        println!("  No storage accounts configured.");
        println!();
        println!("  Add accounts to {}:", config_path.display());
        println!("  [[storage]]");
        println!("  name = \"primary\"");
        println!("  type = \"azure\"    # or \"local\"");
        println!("  account = \"mystorageaccount\"");
        println!("  access_key = \"...\"");
        println!("  default = true");
    } else {
        println!("  Storage accounts ({}):", config.storage.len());
        for s in &config.storage {
            let target = match s.path {
                Some(ref path) => path.clone(),
                None => s.account_name().to_string(),
            };
            println!(
                "    - {} (type={}, target={}{})",
                s.name,
                s.storage_type,
                target,
                if s.default { ", default" } else { "" }
            );
        }
    }

    Ok(())
}
