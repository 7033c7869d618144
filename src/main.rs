//! fuse-filesystem daemon entry point

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fuse_filesystem::config::Config;
use fuse_filesystem::fsapi::registry::FsApiRegistry;
use fuse_filesystem::plugin::FilesystemPlugin;
use fuse_filesystem::server::{ApiBridge, ApiServer};

/// Print usage information
fn print_usage() {
    eprintln!("Usage: fuse-filesystem [config.yaml]");
    eprintln!();
    eprintln!("fuse-filesystem - filesystem plugin served over the local fuse API bridge");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.yaml    Path to configuration file (optional; defaults apply)");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  fuse-filesystem /etc/fuse/filesystem.yaml");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let config = match args.len() {
        1 => Config::default(),
        2 => {
            let config_path = PathBuf::from(&args[1]);
            match Config::from_file(&config_path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Failed to load config: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("fuse-filesystem starting");

    // Build the bridge with the filesystem plugin registered
    let bridge = Arc::new(ApiBridge::new());
    bridge.register_plugin(Arc::new(FilesystemPlugin::new(
        Arc::new(FsApiRegistry::new()),
        config.chunk_size,
    )));

    let server = ApiServer::bind(&config.server.host, config.server.port, bridge.clone()).await?;
    info!(
        "API port {} ready (secret {})",
        server.local_addr().port(),
        bridge.secret()
    );

    // Set up signal handling for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    })?;

    server.serve(shutdown_rx).await?;

    info!("fuse-filesystem exiting");
    Ok(())
}
