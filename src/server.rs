//! DNS server setup and lifecycle management.

use hickory_server::authority::{AuthorityObject, Catalog};
use hickory_server::ServerFuture;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::net::{TcpListener, UdpSocket};
use tracing::{debug, error, info, warn};
use tripwire::Tripwire;

use crate::authority::CnameAuthority;
use crate::classifier::TargetClassifier;
use crate::config::{DnsConfig, ZoneConfig};
use crate::error::DnsError;
use crate::metrics;
use crate::selector::CnameSelector;
use crate::state::{records_from_config, ZoneState};
use crate::weights::{normalize_name, WeightTable};

/// Interval for emitting state metrics.
const METRICS_INTERVAL: Duration = Duration::from_secs(10);

/// Build the weight table: inline config rows, then weight file rows on top.
pub fn load_weights(config: &DnsConfig) -> Result<WeightTable, DnsError> {
    let mut table = WeightTable::from_config(&config.weights);
    if let Some(ref path) = config.weight_file {
        table.merge(WeightTable::load_csv(path)?);
    }
    Ok(table)
}

/// Periodically emit state metrics.
async fn metrics_loop(zones: Vec<ZoneState>, selector: Arc<CnameSelector>, mut tripwire: Tripwire) {
    let mut interval = tokio::time::interval(METRICS_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                for zone in &zones {
                    zone.emit_metrics();
                }
                let weights = selector.weights().len();
                metrics::record_selector_counts(weights, selector.pool_count());
                debug!(
                    zones = zones.len(),
                    weights,
                    pools = selector.pool_count(),
                    "emitted state metrics"
                );
            }
            _ = &mut tripwire => {
                debug!("metrics loop shutting down");
                return;
            }
        }
    }
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

/// Re-read the weight file whenever its modification time changes.
async fn weight_reload_loop(
    config: Arc<DnsConfig>,
    selector: Arc<CnameSelector>,
    path: std::path::PathBuf,
    every: Duration,
    mut tripwire: Tripwire,
) {
    let mut interval = tokio::time::interval(every);
    // The first tick fires immediately; the table is already loaded.
    interval.tick().await;
    let mut last_modified = modified_at(&path).await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let modified = modified_at(&path).await;
                if modified.is_none() || modified == last_modified {
                    continue;
                }
                match load_weights(&config) {
                    Ok(table) => {
                        info!(path = %path.display(), entries = table.len(), "weight file reloaded");
                        selector.replace_weights(table);
                        metrics::record_weight_reload(true);
                        last_modified = modified;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "weight file reload failed, keeping previous table");
                        metrics::record_weight_reload(false);
                    }
                }
            }
            _ = &mut tripwire => {
                debug!("weight reload loop shutting down");
                return;
            }
        }
    }
}

/// Authoritative DNS server for weighted alias names.
pub struct DnsServer {
    config: Arc<DnsConfig>,
    zones: Vec<ZoneState>,
    selector: Arc<CnameSelector>,
}

impl DnsServer {
    /// Create a new DNS server with the given configuration.
    ///
    /// Loads the weight file, if any; a missing or malformed file is an error.
    pub fn new(config: DnsConfig) -> Result<Self, DnsError> {
        if config.zones.is_empty() {
            return Err(DnsError::Config("no zones configured".to_string()));
        }

        let mut origins = HashSet::new();
        for zone in &config.zones {
            if !origins.insert(normalize_name(&zone.origin)) {
                return Err(DnsError::Config(format!(
                    "zone {} configured twice",
                    zone.origin
                )));
            }
        }

        let weights = load_weights(&config)?;
        let classifier = TargetClassifier::new(&config.cluster_pattern);
        let zones = config.zones.iter().map(ZoneState::from_config).collect();

        Ok(Self {
            selector: Arc::new(CnameSelector::new(weights, classifier)),
            zones,
            config: Arc::new(config),
        })
    }

    /// Zones served by this instance.
    pub fn zones(&self) -> &[ZoneState] {
        &self.zones
    }

    /// Shared selector.
    pub fn selector(&self) -> &Arc<CnameSelector> {
        &self.selector
    }

    /// Replace a served zone's aliases and reset the pools tied to it.
    pub fn reload_zone(&self, zone_config: &ZoneConfig) -> Result<(), DnsError> {
        let origin = normalize_name(&zone_config.origin);
        let zone = self
            .zones
            .iter()
            .find(|z| z.origin() == origin)
            .ok_or_else(|| DnsError::Config(format!("zone {origin} is not served")))?;

        let previous = zone.replace_aliases(records_from_config(zone_config));
        let current = zone.names();
        self.selector.invalidate_zone(
            &origin,
            previous.iter().chain(current.iter()).map(String::as_str),
        );
        info!(origin = %origin, names = current.len(), "zone reloaded");
        Ok(())
    }

    /// Re-read the weight table from configuration and the weight file.
    ///
    /// On error the previous table stays in place.
    pub fn reload_weights(&self) -> Result<(), DnsError> {
        let table = load_weights(&self.config)?;
        self.selector.replace_weights(table);
        Ok(())
    }

    /// Build a catalog with one authority per zone.
    pub fn build_catalog(&self) -> Result<Catalog, DnsError> {
        let mut catalog = Catalog::new();
        for zone in &self.zones {
            let authority =
                CnameAuthority::new(self.config.clone(), zone.clone(), self.selector.clone())?;
            let authority: Arc<dyn AuthorityObject> = Arc::new(authority);
            catalog.upsert(authority.origin().clone(), vec![authority]);
        }
        Ok(catalog)
    }

    /// Run the DNS server until the tripwire is triggered.
    pub async fn run(self, tripwire: Tripwire) -> Result<(), DnsError> {
        info!(
            listen_addr = %self.config.listen_addr,
            zones = self.zones.len(),
            weights = self.selector.weights().len(),
            cluster_pattern = %self.selector.classifier().pattern(),
            "Starting cname-wrr-dns server"
        );

        let catalog = self.build_catalog()?;

        // Create server
        let mut server = ServerFuture::new(catalog);

        // Bind UDP
        let udp_socket = UdpSocket::bind(self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, "DNS UDP listening");
        server.register_socket(udp_socket);

        // Bind TCP
        let tcp_listener = TcpListener::bind(self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, "DNS TCP listening");
        server.register_listener(tcp_listener, Duration::from_secs(30));

        for zone in &self.zones {
            info!(
                origin = %zone.origin(),
                names = zone.names_count(),
                records = zone.records_count(),
                "serving zone"
            );
        }

        // Start metrics loop
        let metrics_handle = tokio::spawn(metrics_loop(
            self.zones.clone(),
            self.selector.clone(),
            tripwire.clone(),
        ));

        // Start weight reload loop
        let reload_handle = match self.config.weight_file.clone() {
            Some(path) if self.config.reload_interval_secs > 0 => {
                let every = Duration::from_secs(self.config.reload_interval_secs);
                info!(path = %path.display(), every_secs = every.as_secs(), "watching weight file");
                Some(tokio::spawn(weight_reload_loop(
                    self.config.clone(),
                    self.selector.clone(),
                    path,
                    every,
                    tripwire.clone(),
                )))
            }
            _ => None,
        };

        // Run server until tripwire
        let served = tokio::select! {
            _ = tripwire => {
                info!("DNS server shutdown requested");
                Ok(())
            }
            result = server.block_until_done() => result,
        };

        if let Err(e) = served {
            // The loops only stop on the tripwire, which has not fired.
            error!("DNS server error: {}", e);
            metrics_handle.abort();
            if let Some(handle) = reload_handle {
                handle.abort();
            }
            return Err(e.into());
        }

        let _ = metrics_handle.await;
        if let Some(handle) = reload_handle {
            let _ = handle.await;
        }

        info!("DNS server stopped");
        Ok(())
    }
}
