//! Derived network statistics types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry in the influence ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceEntry {
    /// Normalized citation.
    pub citation: String,
    /// PageRank-style influence score; all scores sum to 1.0.
    pub score: f64,
}

/// A detected community of cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Community index after size-descending sort.
    pub id: usize,
    /// Member citations, sorted ascending.
    pub members: Vec<String>,
}

impl Community {
    /// Number of members.
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Statistics derived from a completed citation network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkStatistics {
    /// Nodes ranked by influence score, descending; ties broken by
    /// lexical citation order.
    pub influence_ranking: Vec<InfluenceEntry>,
    /// Communities sorted by descending size.
    pub communities: Vec<Community>,
    /// Classified-node counts per filing year.
    pub temporal_distribution: BTreeMap<i32, usize>,
    /// Classified-node counts per court level label.
    pub court_distribution: BTreeMap<String, usize>,
    /// Classified-node counts per treatment category label.
    pub treatment_distribution: BTreeMap<String, usize>,
    /// |edges| / (|nodes| × (|nodes| − 1)); 0 for degenerate networks.
    pub density: f64,
    /// |edges| / |nodes|.
    pub avg_out_degree: f64,
}

impl NetworkStatistics {
    /// Zero-filled statistics for a degenerate (root-only) network.
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Sum of all influence scores (1.0 ± tolerance after convergence,
    /// 0.0 when ranking is disabled or the network is degenerate).
    pub fn influence_total(&self) -> f64 {
        self.influence_ranking.iter().map(|e| e.score).sum()
    }
}
