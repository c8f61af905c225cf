use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::Path;
use tokio::io::AsyncReadExt;

use super::store::open_container;

const UPLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Stream a local file into blob `name`.
pub async fn run(base_dir: &Path, name: &str, file: &Path, path: Option<&str>) -> Result<()> {
    let (store, container) = open_container(base_dir, path)?;
    let key = container.key(name);

    let mut input = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("cannot open {}", file.display()))?;
    let mut sink = container.write_blob(name).await?;

    let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = input.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        sink.write(Bytes::copy_from_slice(&buf[..n])).await?;
        total += n as u64;
    }
    sink.finish().await?;

    let account = store.resolve_account(&key).unwrap_or("default");
    println!("Stored {key} ({total} bytes) in account {account}");
    Ok(())
}
