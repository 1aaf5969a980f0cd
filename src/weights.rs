//! Per-name weight pairs for the VM / cluster traffic split.
//!
//! Rows come from the `[[dns.weights]]` config section and from an optional
//! CSV weight file with one `name,vm_weight,cluster_weight` row per line:
//!
//! ```text
//! # name, vm, cluster
//! api.example.com., 3, 1
//! example.com., 1, 1
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::classifier::TargetGroup;
use crate::config::WeightConfig;
use crate::error::DnsError;

/// Normalize a DNS name for use as a map key: lowercase, trailing dot.
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim().trim_end_matches('.');
    let mut normalized = trimmed.to_ascii_lowercase();
    normalized.push('.');
    normalized
}

/// Weight pair for one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightEntry {
    /// Normalized name the weights apply to (alias owner or zone apex).
    pub key: String,
    /// Weight for group A targets.
    pub vm: u32,
    /// Weight for group B targets.
    pub cluster: u32,
}

impl WeightEntry {
    /// Create an entry, normalizing the key.
    pub fn new(key: &str, vm: u32, cluster: u32) -> Self {
        Self {
            key: normalize_name(key),
            vm,
            cluster,
        }
    }

    /// Weight assigned to targets of the given group.
    pub fn weight_for(&self, group: TargetGroup) -> u32 {
        match group {
            TargetGroup::Vm => self.vm,
            TargetGroup::Cluster => self.cluster,
        }
    }
}

type CsvRow = (String, u32, u32);

/// Read-only lookup from name to weight pair.
///
/// Replaced wholesale on reload, never mutated while shared.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    entries: HashMap<String, WeightEntry>,
}

impl WeightTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from entries; later entries win on duplicate keys.
    pub fn from_entries(entries: impl IntoIterator<Item = WeightEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    /// Build a table from the `[[dns.weights]]` config rows.
    pub fn from_config(rows: &[WeightConfig]) -> Self {
        Self::from_entries(
            rows.iter()
                .map(|row| WeightEntry::new(&row.zone, row.vm, row.cluster)),
        )
    }

    /// Load a CSV weight file.
    pub fn load_csv(path: &Path) -> Result<Self, DnsError> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_csv_reader(file)?;
        debug!(path = %path.display(), entries = table.len(), "loaded weight file");
        Ok(table)
    }

    /// Parse CSV rows of `name,vm_weight,cluster_weight` without a header.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DnsError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut table = Self::new();
        let mut record = csv::StringRecord::new();
        while csv.read_record(&mut record)? {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let (name, vm, cluster): CsvRow =
                record
                    .deserialize(None)
                    .map_err(|e: csv::Error| DnsError::WeightFile {
                        line,
                        reason: e.to_string(),
                    })?;
            if name.trim_end_matches('.').is_empty() {
                return Err(DnsError::WeightFile {
                    line,
                    reason: "empty name".to_string(),
                });
            }
            table.insert(WeightEntry::new(&name, vm, cluster));
        }
        Ok(table)
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, entry: WeightEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    /// Copy every entry of `other` over this table.
    pub fn merge(&mut self, other: WeightTable) {
        self.entries.extend(other.entries);
    }

    /// Look up the weight pair for a name.
    pub fn get(&self, name: &str) -> Option<&WeightEntry> {
        self.entries.get(&normalize_name(name))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
