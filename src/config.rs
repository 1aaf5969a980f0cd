//! Configuration types for cname-wrr-dns.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::classifier::DEFAULT_CLUSTER_PATTERN;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// DNS server configuration.
    pub dns: DnsConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// DNS server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Address for DNS server to listen on (UDP and TCP).
    pub listen_addr: SocketAddr,

    /// TTL for DNS records in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// SOA record configuration.
    #[serde(default)]
    pub soa: SoaConfig,

    /// Zones served by this instance.
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,

    /// Inline weight rows. Rows from `weight_file` override these.
    #[serde(default)]
    pub weights: Vec<WeightConfig>,

    /// Optional CSV weight file (`name,vm_weight,cluster_weight`).
    #[serde(default)]
    pub weight_file: Option<PathBuf>,

    /// Seconds between weight file change checks; 0 disables reloading.
    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,

    /// Substring marking a target as cluster-native (group B).
    #[serde(default = "default_cluster_pattern")]
    pub cluster_pattern: String,
}

/// One authoritative zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone apex (e.g., "example.com").
    pub origin: String,

    /// Alias names in this zone.
    #[serde(default)]
    pub aliases: Vec<AliasConfig>,
}

/// A name publishing one or more alias targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasConfig {
    /// Owner name; relative names are qualified with the zone origin and
    /// `@` means the apex.
    pub name: String,

    /// Alias targets in zone order.
    pub targets: Vec<String>,
}

/// Weight pair for one name (alias owner or zone apex).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Name the weights apply to.
    pub zone: String,

    /// Weight for VM fleet targets.
    pub vm: u32,

    /// Weight for cluster fleet targets.
    pub cluster: u32,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "debug", "cname_wrr_dns=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus metrics exporter address.
    #[serde(default)]
    pub prometheus_addr: Option<SocketAddr>,

    /// OpenTelemetry configuration.
    #[serde(default)]
    pub opentelemetry: Option<OpenTelemetryConfig>,
}

/// OpenTelemetry exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenTelemetryConfig {
    /// OTLP endpoint (e.g., "http://localhost:4317").
    pub endpoint: String,

    /// Service name for traces.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prometheus_addr: None,
            opentelemetry: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "cname-wrr-dns".to_string()
}

fn default_cluster_pattern() -> String {
    DEFAULT_CLUSTER_PATTERN.to_string()
}

fn default_reload_interval() -> u64 {
    30
}

/// SOA (Start of Authority) record configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoaConfig {
    /// Primary nameserver hostname (e.g., "ns1.example.com").
    pub mname: String,

    /// Admin email in DNS format (e.g., "admin.example.com" for admin@example.com).
    pub rname: String,

    /// Refresh interval in seconds.
    #[serde(default = "default_refresh")]
    pub refresh: u32,

    /// Retry interval in seconds.
    #[serde(default = "default_retry")]
    pub retry: u32,

    /// Expire time in seconds.
    #[serde(default = "default_expire")]
    pub expire: u32,

    /// Minimum TTL in seconds.
    #[serde(default = "default_minimum")]
    pub minimum: u32,
}

fn default_ttl() -> u32 {
    60
}

fn default_refresh() -> u32 {
    3600
}

fn default_retry() -> u32 {
    600
}

fn default_expire() -> u32 {
    604800
}

fn default_minimum() -> u32 {
    60
}

impl Default for SoaConfig {
    fn default() -> Self {
        Self {
            mname: "ns1.example.com".to_string(),
            rname: "admin.example.com".to_string(),
            refresh: default_refresh(),
            retry: default_retry(),
            expire: default_expire(),
            minimum: default_minimum(),
        }
    }
}
