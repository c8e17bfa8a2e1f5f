//! Mock Relay - CLI entry point

use anyhow::Result;
use clap::Parser;
use mock_relay::materialize::ResponseMaterializer;
use mock_relay::replay::{ReqwestDispatcher, RequestReplayer};
use mock_relay::server;
use mock_relay::service::OsHostnameResolver;
use mock_relay::store::MemoryStore;
use mock_relay::{MockRelayConfig, MockService};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mock-relay",
    about = "Configurable mock endpoint server with canned responses and request relay",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mock-relay.yaml")]
    config: PathBuf,

    /// Listen address override (host:port)
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Print default config if requested
    if args.print_config {
        let default_config = include_str!("../demos/default-config.yaml");
        println!("{}", default_config);
        return Ok(());
    }

    // Load configuration
    let config = if args.config.exists() {
        info!(path = ?args.config, "Loading configuration");
        MockRelayConfig::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Configuration file not found: {:?}", args.config);
    } else {
        info!("Using default configuration (no seeded definitions)");
        MockRelayConfig::default()
    };

    // Validate and exit if requested
    if args.validate {
        config.validate()?;
        println!(
            "Configuration is valid ({} seeded responses, {} seeded requests)",
            config.responses.len(),
            config.requests.len()
        );
        return Ok(());
    }

    let address = args
        .listen
        .clone()
        .unwrap_or_else(|| config.listen.address());
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let local_addr = listener.local_addr()?;

    // One channel drives both in-flight delay interruption and drain.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let dispatcher = ReqwestDispatcher::new(config.replay.timeout())?;
    let service = Arc::new(MockService::new(
        Arc::new(MemoryStore::new()),
        ResponseMaterializer::new(shutdown_rx.clone()),
        RequestReplayer::new(Arc::new(dispatcher)),
        Box::new(OsHostnameResolver),
        config.callback.clone(),
        local_addr.port(),
    ));
    service.seed(config.responses, config.requests).await?;

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received, draining");
        let _ = shutdown_tx.send(true);
    });

    info!(address = %local_addr, "Mock relay listening");
    server::serve(listener, service, shutdown_rx).await?;

    info!("Server stopped");
    Ok(())
}
