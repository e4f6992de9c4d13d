//! arcview - Algorand NFT metadata viewer
//!
//! Resolves a token's metadata across the ARC-19, ARC-3, ARC-69 and custom
//! conventions and prints it as JSON.

use anyhow::{Context, Result};
use arcview::presentation::{display_fields, property};
use arcview::NftViewer;
use arcview_common::config::{ConfigResolver, LoggingConfig, TomlConfig};
use arcview_common::Network;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command-line arguments for arcview
#[derive(Parser, Debug)]
#[command(name = "arcview")]
#[command(about = "Resolve Algorand NFT metadata (ARC-3, ARC-19, ARC-69)")]
#[command(version)]
struct Args {
    /// Asset (token) id
    asset_id: u64,

    /// Query TestNet instead of the configured network
    #[arg(long)]
    testnet: bool,

    /// Config file path
    #[arg(short, long, env = "ARCVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// IPFS gateway prefix
    #[arg(long, value_name = "URL")]
    gateway: Option<String>,

    /// Print the token's display fields instead of the full asset
    #[arg(long)]
    fields: bool,

    /// Download resolved media into DIR
    #[arg(long, value_name = "DIR")]
    download: Option<PathBuf>,

    /// Print a single metadata property
    #[arg(long, value_name = "KEY")]
    property: Option<String>,
}

/// Resolve configuration and apply CLI overrides
///
/// The final subscriber depends on the loaded `[logging]` section, so events
/// raised while loading go to a warn-level bootstrap subscriber on
/// `bootstrap_writer`.
fn load_config<W>(args: &Args, bootstrap_writer: W) -> Result<TomlConfig>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let bootstrap = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(bootstrap_writer)
        .finish();

    let mut config = tracing::subscriber::with_default(bootstrap, || {
        ConfigResolver::new(args.config.clone()).resolve()
    })
    .context("Failed to load configuration")?;

    if args.testnet {
        config.network = Network::TestNet;
    }
    if let Some(gateway) = &args.gateway {
        config.ipfs_gateway = gateway.clone();
    }
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = FmtSubscriber::builder().with_env_filter(filter);

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing::subscriber::set_global_default(
                builder
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .finish(),
            )?;
        }
        None => {
            tracing::subscriber::set_global_default(
                builder.with_writer(std::io::stderr).finish(),
            )?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args, std::io::stderr)?;
    init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        build_timestamp = env!("BUILD_TIMESTAMP"),
        profile = env!("BUILD_PROFILE"),
        "Starting arcview"
    );
    info!(
        asset_id = args.asset_id,
        network = %config.network,
        gateway = %config.ipfs_gateway,
        "Resolving asset"
    );

    let viewer = NftViewer::from_config(&config).context("Failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning in-flight lookups");
            on_interrupt.cancel();
        }
    });

    if let Some(dir) = &args.download {
        let (asset, files) = viewer
            .asset_with_files_with_cancellation(args.asset_id, config.network, &cancel)
            .await
            .with_context(|| format!("Failed to resolve asset {}", args.asset_id))?;
        for file in &files {
            let path = file
                .write_to(dir)
                .await
                .with_context(|| format!("Failed to write {}", file.name))?;
            println!("{}", path.display());
        }
        info!(asset_id = asset.index, files = files.len(), "Media written");
        return Ok(());
    }

    let asset = viewer
        .asset_with_cancellation(args.asset_id, config.network, &cancel)
        .await
        .with_context(|| format!("Failed to resolve asset {}", args.asset_id))?;

    if let Some(key) = &args.property {
        match property(&asset.metadata, key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
            None => warn!(key = %key, "Property not defined"),
        }
    } else if args.fields {
        for (key, value) in display_fields(&asset) {
            println!("{}: {}", key, value);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&asset)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_missing_config_warning_reaches_bootstrap_log() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let args = Args::parse_from([
            "arcview",
            "42",
            "--testnet",
            "--config",
            missing.to_str().unwrap(),
        ]);

        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let config = load_config(&args, move || writer.clone()).unwrap();

        assert_eq!(config.network, Network::TestNet);
        assert!(
            buffer.contents().contains("Config file not found"),
            "bootstrap log was: {}",
            buffer.contents()
        );
    }
}
