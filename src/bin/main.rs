//! cname-wrr-dns binary entry point.

use clap::Parser;
use cname_wrr_dns::{telemetry, Config, DnsServer};
use std::path::PathBuf;
use tracing::{error, info};
use tripwire::Tripwire;

/// Authoritative DNS server that splits alias traffic by weight.
#[derive(Parser, Debug)]
#[command(name = "cname-wrr-dns")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML).
    #[arg(short, long, default_value = "cname-wrr-dns.toml")]
    config: PathBuf,

    /// Override the weight file from the configuration.
    #[arg(short, long)]
    weights: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let mut config: Config = config::Config::builder()
        .add_source(config::File::from(args.config.clone()))
        .add_source(
            config::Environment::with_prefix("CNAME_WRR_DNS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    if let Some(weights) = args.weights {
        config.dns.weight_file = Some(weights);
    }

    // Initialize telemetry
    telemetry::init(&config.telemetry).map_err(|e| e as Box<dyn std::error::Error>)?;

    info!(
        config_file = %args.config.display(),
        listen_addr = %config.dns.listen_addr,
        zones = config.dns.zones.len(),
        weight_file = ?config.dns.weight_file,
        "Starting cname-wrr-dns"
    );

    // Setup graceful shutdown
    let (tripwire, tripwire_worker) = Tripwire::new_signals();
    tokio::spawn(tripwire_worker);

    // Run DNS server
    let result = match DnsServer::new(config.dns) {
        Ok(server) => server.run(tripwire).await,
        Err(e) => Err(e),
    };

    // Shutdown telemetry
    telemetry::shutdown();

    if let Err(e) = result {
        error!("DNS server error: {}", e);
        return Err(e.into());
    }

    info!("cname-wrr-dns shutdown complete");
    Ok(())
}
