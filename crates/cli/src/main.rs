use clap::Parser;
use ferrous_split_domain::Overrides;
use ferrous_split_infrastructure::dns::DnsServerHandler;
use std::sync::Arc;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "ferrous-split")]
#[command(version)]
#[command(about = "Ferrous Split - split-horizon DNS dispatcher")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", default_value = "./config.json")]
    config: String,

    /// SOCKS5 proxy (host:port) applied to every upstream
    #[arg(short = 's', long, value_name = "HOST:PORT")]
    socks5: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = Overrides {
        socks5_address: cli.socks5.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(&cli.config, overrides.clone())?;

    bootstrap::init_logging(&config.logging);

    info!("Starting Ferrous Split v{}", env!("CARGO_PKG_VERSION"));

    let dns_services = di::DnsServices::new(&config).await;
    let handler = Arc::new(DnsServerHandler::new(dns_services.handler_use_case));

    let listeners = server::bind_dns_listeners(config.bind_address).await?;
    let dns_handler = Arc::clone(&handler);
    let dns_server = tokio::spawn(async move {
        server::run_dns_server(listeners, dns_handler).await;
    });

    #[cfg(unix)]
    tokio::spawn(reload_on_sighup(cli.config.clone(), overrides, config, handler));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for Ctrl+C");
            }
            info!("Received Ctrl+C, shutting down");
        }
        result = dns_server => {
            if let Err(e) = result {
                error!(error = %e, "DNS server task failed");
            }
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Rebuilds everything from the configuration file on SIGHUP and swaps it in.
/// A failed reload keeps the running configuration.
#[cfg(unix)]
async fn reload_on_sighup(
    config_path: String,
    overrides: Overrides,
    mut running: ferrous_split_domain::Config,
    handler: Arc<DnsServerHandler>,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(sighup) => sighup,
        Err(e) => {
            error!(error = %e, "Failed to register SIGHUP handler, reload disabled");
            return;
        }
    };

    while sighup.recv().await.is_some() {
        info!(config = %config_path, "Received SIGHUP, reloading configuration");

        let config = match bootstrap::load_config(&config_path, overrides.clone()) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Reload failed, keeping running configuration");
                continue;
            }
        };

        bootstrap::warn_on_static_changes(&running, &config);

        let dns_services = di::DnsServices::new(&config).await;
        handler.replace(dns_services.handler_use_case);
        running = config;

        info!("Configuration reloaded");
    }
}
