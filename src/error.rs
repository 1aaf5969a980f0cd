//! Error types for cname-wrr-dns.

use thiserror::Error;

/// Errors that can occur in the DNS server.
///
/// The selection path never produces one of these; it degrades to the first
/// alias target instead. Errors come from startup, configuration and reload.
#[derive(Debug, Error)]
pub enum DnsError {
    /// IO error (network, file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// DNS protocol error
    #[error("DNS protocol error: {0}")]
    Proto(#[from] hickory_proto::ProtoError),

    /// Weight file could not be read as CSV
    #[error("Weight file error: {0}")]
    Csv(#[from] csv::Error),

    /// Weight file row is malformed
    #[error("Weight file row {line}: {reason}")]
    WeightFile {
        /// 1-based line number of the offending row.
        line: u64,
        /// What was wrong with it.
        reason: String,
    },

    /// Failed to parse a domain name
    #[error("Invalid name: {0}")]
    InvalidName(String),
}
