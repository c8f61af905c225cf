use anyhow::Result;
use std::path::Path;

use blobshard_core::types::BlobMetadata;

use super::store::open_container;

pub async fn run(base_dir: &Path, path: Option<&str>, prefix: &str, json: bool) -> Result<()> {
    let (_, container) = open_container(base_dir, path)?;
    let blobs = container.list_blobs_by_prefix(prefix).await?;

    if json {
        let entries: Vec<&BlobMetadata> = blobs.values().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if blobs.is_empty() {
        println!("No blobs found under {}.", container.path());
        return Ok(());
    }

    println!("{:<60} {:>12}", "NAME", "SIZE");
    println!("{}", "-".repeat(73));

    let mut total = 0u64;
    for blob in blobs.values() {
        total += blob.length;
        println!("{:<60} {:>12}", blob.name, format_bytes(blob.length));
    }
    println!("\n{} blob(s), {}", blobs.len(), format_bytes(total));

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
