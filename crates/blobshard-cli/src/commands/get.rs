use anyhow::Result;
use futures::TryStreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::store::open_container;

/// Stream blob `name` to `output`, or to stdout.
pub async fn run(
    base_dir: &Path,
    name: &str,
    output: Option<&Path>,
    path: Option<&str>,
) -> Result<()> {
    let (_, container) = open_container(base_dir, path)?;
    let mut stream = container.read_blob(name).await?;

    let mut out: Box<dyn tokio::io::AsyncWrite + Unpin + Send> = match output {
        Some(file) => Box::new(tokio::fs::File::create(file).await?),
        None => Box::new(tokio::io::stdout()),
    };

    let mut total = 0u64;
    while let Some(chunk) = stream.try_next().await? {
        out.write_all(&chunk).await?;
        total += chunk.len() as u64;
    }
    out.flush().await?;

    if let Some(file) = output {
        println!("Wrote {total} bytes to {}", file.display());
    }
    Ok(())
}
