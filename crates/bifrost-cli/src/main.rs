//! Bifrost CLI: upload and delete files through the rainbow bridge.
//!
//! Configuration comes from BIFROST_* environment variables (and `.env`);
//! connection flags override them.

use std::path::PathBuf;

use anyhow::Context;
use bifrost_cli::{file_options, init_tracing, redacted, upload_file, ConfigOverrides};
use bifrost_core::{BridgeConfig, File, MultiFile};
use bifrost_storage::new_rainbow_bridge;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "bifrost", about = "Upload files to S3, GCS, Wasabi or Pinata")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Provider: s3, gcs, wasabi or pinata
    #[arg(long, global = true)]
    provider: Option<String>,
    /// Default bucket
    #[arg(long, global = true)]
    bucket: Option<String>,
    #[arg(long, global = true)]
    region: Option<String>,
    /// Custom endpoint (S3-compatible host or Pinata API URL)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Per-operation timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Log failed batch entries and missing buckets
    #[arg(long, global = true)]
    debug: bool,
    /// Make uploads public unless --acl says otherwise
    #[arg(long, global = true)]
    public_read: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one file
    Upload {
        path: PathBuf,
        /// Stored name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        /// public-read or private
        #[arg(long)]
        acl: Option<String>,
        #[arg(long)]
        content_type: Option<String>,
        /// Metadata entry, repeatable: --meta key=value
        #[arg(long = "meta")]
        metadata: Vec<String>,
    },
    /// Upload several files, reporting each outcome
    UploadMany {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// ACL applied to every file
        #[arg(long)]
        acl: Option<String>,
        /// Upload up to N files at once
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Delete a stored object (for Pinata, the name is the CID)
    Delete { name: String },
    /// Connect, print the resolved configuration and disconnect
    Check,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let concurrency = match &cli.command {
        Commands::UploadMany { concurrency, .. } => *concurrency,
        _ => None,
    };
    let overrides = ConfigOverrides {
        provider: cli.connection.provider,
        bucket: cli.connection.bucket,
        region: cli.connection.region,
        endpoint: cli.connection.endpoint,
        timeout: cli.connection.timeout,
        debug: cli.connection.debug,
        public_read: cli.connection.public_read,
        concurrency,
    };
    let config = overrides.apply(
        BridgeConfig::from_env().context("Failed to load configuration from environment")?,
    );

    let mut bridge = new_rainbow_bridge(&config)
        .await
        .with_context(|| format!("Failed to connect to provider '{}'", config.provider))?;

    match cli.command {
        Commands::Upload {
            path,
            name,
            acl,
            content_type,
            metadata,
        } => {
            let options = file_options(acl.as_deref(), content_type.as_deref(), &metadata)?;
            let uploaded = bridge
                .upload_file(upload_file(path, name, options))
                .await
                .context("Upload failed")?;
            print_json(&uploaded)?;
        }
        Commands::UploadMany { paths, acl, .. } => {
            let mut multi = MultiFile::new(paths.into_iter().map(File::from_path).collect());
            multi.global_options = file_options(acl.as_deref(), None, &[])?;

            let result = bridge
                .upload_multi_file(multi)
                .await
                .context("Batch upload failed")?;
            print_json(&result)?;
            if let Some(err) = result.error() {
                bridge.disconnect().await?;
                return Err(err).context("Some files were not uploaded");
            }
        }
        Commands::Delete { name } => {
            bridge
                .delete_file(&File::named(name.as_str()))
                .await
                .with_context(|| format!("Failed to delete '{}'", name))?;
            tracing::info!(name = %name, "Deleted");
        }
        Commands::Check => {
            print_json(&redacted(bridge.config()))?;
        }
    }

    bridge.disconnect().await?;
    Ok(())
}
