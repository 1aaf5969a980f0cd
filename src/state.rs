//! In-memory zone data: alias records per owner name.
//!
//! Each zone is a cheap-to-clone handle over shared state. Reloads replace
//! a zone's aliases wholesale and bump the SOA serial.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::ZoneConfig;
use crate::metrics;
use crate::weights::normalize_name;

/// One alias (CNAME) record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRecord {
    /// Owner name, normalized.
    pub name: String,
    /// Target name, as configured plus a trailing dot.
    pub target: String,
}

impl AliasRecord {
    /// Create a record, normalizing the owner name.
    pub fn new(name: &str, target: &str) -> Self {
        let mut target = target.trim().to_string();
        if !target.ends_with('.') {
            target.push('.');
        }
        Self {
            name: normalize_name(name),
            target,
        }
    }
}

/// Qualify a possibly relative owner name against the zone origin.
///
/// `@` is the apex; names already inside the zone are kept as is.
pub fn qualify(name: &str, origin: &str) -> String {
    let origin = normalize_name(origin);
    let name = name.trim();
    if name == "@" || name.is_empty() {
        return origin;
    }
    let normalized = normalize_name(name);
    if normalized == origin || normalized.ends_with(&format!(".{origin}")) {
        normalized
    } else {
        format!("{}.{}", normalized.trim_end_matches('.'), origin)
    }
}

/// Thread-safe alias data for one zone.
#[derive(Debug, Clone)]
pub struct ZoneState {
    inner: Arc<RwLock<ZoneStateInner>>,
}

#[derive(Debug)]
struct ZoneStateInner {
    /// Zone apex, normalized.
    origin: String,

    /// owner name -> alias records in zone order
    aliases: HashMap<String, Vec<AliasRecord>>,

    /// Serial number for SOA (incremented on changes)
    serial: u32,
}

impl ZoneState {
    /// Create an empty zone.
    pub fn new(origin: &str) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ZoneStateInner {
                origin: normalize_name(origin),
                aliases: HashMap::new(),
                serial: 1,
            })),
        }
    }

    /// Build a zone from its configuration.
    pub fn from_config(config: &ZoneConfig) -> Self {
        let state = Self::new(&config.origin);
        state.replace_aliases(records_from_config(config));
        state
    }

    /// Zone apex.
    pub fn origin(&self) -> String {
        self.inner.read().origin.clone()
    }

    /// Append an alias record.
    #[cfg(test)]
    pub fn insert_alias(&self, record: AliasRecord) {
        let mut inner = self.inner.write();
        debug!(name = %record.name, target = %record.target, "inserting alias");
        inner
            .aliases
            .entry(record.name.clone())
            .or_default()
            .push(record);
        inner.serial = inner.serial.wrapping_add(1);
    }

    /// Replace every alias record at once. Returns the previous owner names.
    pub fn replace_aliases(&self, records: Vec<AliasRecord>) -> Vec<String> {
        let mut aliases: HashMap<String, Vec<AliasRecord>> = HashMap::new();
        for record in records {
            aliases.entry(record.name.clone()).or_default().push(record);
        }

        let mut inner = self.inner.write();
        let previous = std::mem::replace(&mut inner.aliases, aliases);
        inner.serial = inner.serial.wrapping_add(1);
        debug!(
            origin = %inner.origin,
            names = inner.aliases.len(),
            serial = inner.serial,
            "replaced zone aliases"
        );
        previous.into_keys().collect()
    }

    /// Alias records for a name, in zone order. Empty if unknown.
    pub fn lookup_aliases(&self, name: &str) -> Vec<AliasRecord> {
        let inner = self.inner.read();
        inner
            .aliases
            .get(&normalize_name(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Check if the name has alias records.
    #[cfg(test)]
    pub fn has_name(&self, name: &str) -> bool {
        self.inner.read().aliases.contains_key(&normalize_name(name))
    }

    /// Owner names with alias records.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().aliases.keys().cloned().collect()
    }

    /// Get current SOA serial.
    pub fn serial(&self) -> u32 {
        self.inner.read().serial
    }

    /// Number of owner names.
    pub fn names_count(&self) -> usize {
        self.inner.read().aliases.len()
    }

    /// Number of alias records.
    pub fn records_count(&self) -> usize {
        self.inner.read().aliases.values().map(Vec::len).sum()
    }

    /// Emit current zone metrics.
    pub fn emit_metrics(&self) {
        let inner = self.inner.read();
        let records = inner.aliases.values().map(Vec::len).sum();
        metrics::record_zone_counts(&inner.origin, inner.aliases.len(), records);
        metrics::record_serial(&inner.origin, inner.serial);
    }
}

/// Expand a zone config into qualified alias records.
pub fn records_from_config(config: &ZoneConfig) -> Vec<AliasRecord> {
    config
        .aliases
        .iter()
        .flat_map(|alias| {
            let owner = qualify(&alias.name, &config.origin);
            alias
                .targets
                .iter()
                .map(move |target| AliasRecord::new(&owner, target))
        })
        .collect()
}
