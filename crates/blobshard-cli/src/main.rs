mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::container::ContainerAction;

#[derive(Parser)]
#[command(name = "blobshard")]
#[command(about = "Blob store sharded across cloud storage accounts")]
#[command(version)]
struct Cli {
    /// Path to the blobshard config directory (default: ~/.blobshard)
    #[arg(long, global = true, env = "BLOBSHARD_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the container
    Init,

    /// Show current configuration
    Config,

    /// Show which account blob names route to
    Route {
        /// Blob names, relative to the blob path
        #[arg(required = true)]
        names: Vec<String>,
        /// Blob path (default: repository.base_path)
        #[arg(long)]
        path: Option<String>,
    },

    /// Check, create or remove the container in every account
    Container {
        #[arg(value_enum)]
        action: ContainerAction,
        /// Container name (default: repository.container)
        #[arg(long)]
        name: Option<String>,
    },

    /// List blobs under the blob path
    Ls {
        #[arg(long)]
        path: Option<String>,
        /// Only list names starting with this prefix
        #[arg(long, default_value = "")]
        prefix: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Upload a file as a blob
    Put {
        name: String,
        file: PathBuf,
        #[arg(long)]
        path: Option<String>,
    },

    /// Download a blob
    Get {
        name: String,
        /// Destination file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        path: Option<String>,
    },

    /// Delete a blob
    Rm {
        name: String,
        #[arg(long)]
        path: Option<String>,
    },

    /// Check whether a blob exists
    Exists {
        name: String,
        #[arg(long)]
        path: Option<String>,
    },

    /// Delete everything under a path in every account (best effort)
    Cleanup {
        /// Path to clean (default: the whole container)
        path: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blobshard=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let base_dir = match cli.config_dir {
        Some(ref dir) => dir.clone(),
        None => blobshard_core::config::BlobShardConfig::default_base_dir()?,
    };

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Init => rt.block_on(commands::init::run(&base_dir)),
        Commands::Config => commands::config::run(&base_dir),
        Commands::Route {
            ref names,
            ref path,
        } => commands::route::run(&base_dir, names, path.as_deref()),
        Commands::Container { action, ref name } => {
            rt.block_on(commands::container::run(&base_dir, action, name.as_deref()))
        }
        Commands::Ls {
            ref path,
            ref prefix,
            json,
        } => rt.block_on(commands::ls::run(&base_dir, path.as_deref(), prefix, json)),
        Commands::Put {
            ref name,
            ref file,
            ref path,
        } => rt.block_on(commands::put::run(&base_dir, name, file, path.as_deref())),
        Commands::Get {
            ref name,
            ref output,
            ref path,
        } => rt.block_on(commands::get::run(
            &base_dir,
            name,
            output.as_deref(),
            path.as_deref(),
        )),
        Commands::Rm { ref name, ref path } => {
            rt.block_on(commands::blob::rm(&base_dir, name, path.as_deref()))
        }
        Commands::Exists { ref name, ref path } => {
            rt.block_on(commands::blob::exists(&base_dir, name, path.as_deref()))
        }
        Commands::Cleanup { ref path, dry_run } => {
            rt.block_on(commands::cleanup::run(&base_dir, path.as_deref(), dry_run))
        }
    }
}
