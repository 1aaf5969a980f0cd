//! Target classification by naming convention.
//!
//! Alias targets are split into two fleets: names that carry the
//! cluster-service pattern (e.g. `api.default.svc.cluster.local`) belong to
//! the cluster fleet, everything else to the VM fleet.

use std::fmt;

/// Default substring identifying cluster-native service addressing.
pub const DEFAULT_CLUSTER_PATTERN: &str = "svc.cluster";

/// Fleet a target belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetGroup {
    /// Group A: legacy virtual-machine fleet.
    Vm,
    /// Group B: container-orchestrated fleet.
    Cluster,
}

impl TargetGroup {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetGroup::Vm => "vm",
            TargetGroup::Cluster => "cluster",
        }
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buckets alias targets into [`TargetGroup`]s.
#[derive(Debug, Clone)]
pub struct TargetClassifier {
    /// Lowercased pattern.
    pattern: String,
}

impl Default for TargetClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_PATTERN)
    }
}

impl TargetClassifier {
    /// Create a classifier matching the given cluster pattern.
    ///
    /// Matching is case-insensitive, like DNS names. An empty pattern
    /// matches nothing, so every target lands in [`TargetGroup::Vm`].
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_ascii_lowercase(),
        }
    }

    /// The pattern in use.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Classify a target name.
    pub fn classify(&self, target: &str) -> TargetGroup {
        let pattern = self.pattern.as_bytes();
        if pattern.is_empty() {
            return TargetGroup::Vm;
        }
        let matched = target
            .as_bytes()
            .windows(pattern.len())
            .any(|window| window.eq_ignore_ascii_case(pattern));
        if matched {
            TargetGroup::Cluster
        } else {
            TargetGroup::Vm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_service_is_cluster() {
        let classifier = TargetClassifier::default();
        assert_eq!(
            classifier.classify("svcA.svc.cluster.local"),
            TargetGroup::Cluster
        );
        assert_eq!(
            classifier.classify("api.default.svc.cluster.local."),
            TargetGroup::Cluster
        );
    }

    #[test]
    fn test_ec2_host_is_vm() {
        let classifier = TargetClassifier::default();
        assert_eq!(classifier.classify("host1.ec2.internal"), TargetGroup::Vm);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let classifier = TargetClassifier::new("SVC.Cluster");
        assert_eq!(
            classifier.classify("API.SVC.CLUSTER.LOCAL"),
            TargetGroup::Cluster
        );
    }

    #[test]
    fn test_garbage_defaults_to_vm() {
        let classifier = TargetClassifier::default();
        assert_eq!(classifier.classify(""), TargetGroup::Vm);
        assert_eq!(classifier.classify("..."), TargetGroup::Vm);
        // Partial pattern is not enough
        assert_eq!(classifier.classify("svc.local"), TargetGroup::Vm);
    }

    #[test]
    fn test_pattern_at_edges_and_short_targets() {
        let classifier = TargetClassifier::default();
        assert_eq!(classifier.classify("svc.cluster"), TargetGroup::Cluster);
        assert_eq!(classifier.classify("a.SVC.CLUSTER"), TargetGroup::Cluster);
        assert_eq!(classifier.classify("svc.cluste"), TargetGroup::Vm);
        assert_eq!(classifier.classify("svc"), TargetGroup::Vm);
    }

    #[test]
    fn test_empty_pattern_matches_nothing() {
        let classifier = TargetClassifier::new("");
        assert_eq!(classifier.classify("a.svc.cluster.local"), TargetGroup::Vm);
    }
}
