//! cname-wrr-dns - An authoritative DNS server that splits alias traffic
//! between two backend fleets.
//!
//! During a migration a public name is published with several CNAME targets,
//! some on the legacy VM fleet and some on the cluster fleet. For every query
//! this server answers with exactly one of them, chosen by a smooth weighted
//! round-robin over a per-name weight pair.
//!
//! ## Features
//!
//! - Smooth (GCD-reduced) weighted round-robin per alias name or zone apex
//! - Fleet classification by target naming (`svc.cluster` means cluster)
//! - Low-entropy shuffle for names without weights
//! - Weight table from config and a CSV file, reloaded on change
//! - Graceful shutdown support
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          cname-wrr-dns                           │
//! │                                                                  │
//! │  ┌─────────────┐   aliases   ┌──────────────┐   one CNAME        │
//! │  │ ZoneState   │────────────▶│ CnameSelector│──────────┐         │
//! │  │ (per zone)  │             │              │          ▼         │
//! │  └─────────────┘             │ WeightTable  │   ┌─────────────┐  │
//! │                              │ PoolRegistry │   │ Hickory DNS │◀─┼─ UDP/TCP
//! │  weights.csv ── reload ─────▶│ Classifier   │   │ Server      │  │
//! │                              └──────────────┘   └─────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Selection
//!
//! ```text
//! api.example.com CNAME?
//!   → alias records [x.ec2.internal, y.ec2.internal, z.default.svc.cluster.local]
//!   → weights for api.example.com (or example.com): vm=2 cluster=1
//!   → pool weights [2, 2, 1] → x, y, x, y, z, x, ...
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use cname_wrr_dns::{Config, DnsServer};
//! use tripwire::Tripwire;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config: Config = config::Config::builder()
//!         .add_source(config::File::with_name("cname-wrr-dns.toml"))
//!         .build()
//!         .unwrap()
//!         .try_deserialize()
//!         .unwrap();
//!
//!     let (tripwire, worker) = Tripwire::new_signals();
//!     tokio::spawn(worker);
//!
//!     let server = DnsServer::new(config.dns).unwrap();
//!     server.run(tripwire).await.unwrap();
//! }
//! ```

#![warn(missing_docs)]

pub mod authority;
pub mod classifier;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod selector;
pub mod server;
pub mod shuffle;
pub mod state;
pub mod telemetry;
pub mod weights;
pub mod wrr;

// Re-export main types
pub use classifier::{TargetClassifier, TargetGroup};
pub use config::{Config, DnsConfig, SoaConfig, TelemetryConfig, WeightConfig, ZoneConfig};
pub use error::DnsError;
pub use selector::{CnameSelector, Selection};
pub use server::DnsServer;
pub use state::{AliasRecord, ZoneState};
pub use weights::{WeightEntry, WeightTable};
pub use wrr::SmoothWrr;
