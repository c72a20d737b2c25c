//! Network analytics: influence ranking, community detection, and
//! distribution metrics over a completed citation network.
//!
//! Analytics are pure functions of the network; they never touch the
//! resolver. The costly passes (influence, communities) are gated by
//! [`AnalyticsOptions`] so callers can skip them for large networks.

pub mod community;
pub mod distribution;
pub mod influence;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::types::{CitationNetwork, NetworkStatistics};

pub use community::detect_communities;
pub use influence::influence_ranking;

/// Which analytics passes to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalyticsOptions {
    /// Compute the influence ranking.
    pub influence: bool,
    /// Run community detection.
    pub communities: bool,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            influence: true,
            communities: true,
        }
    }
}

impl From<&AnalysisConfig> for AnalyticsOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            influence: config.enable_advanced_metrics,
            communities: config.enable_community_detection,
        }
    }
}

/// Compute statistics for a citation network.
///
/// A degenerate (single-node) network yields zeroed statistics.
pub fn analyze(network: &CitationNetwork, options: &AnalyticsOptions) -> NetworkStatistics {
    if network.node_count() <= 1 {
        return NetworkStatistics::zeroed();
    }

    debug!(
        nodes = network.node_count(),
        edges = network.edge_count(),
        "computing network statistics"
    );

    NetworkStatistics {
        influence_ranking: if options.influence {
            influence::influence_ranking(network)
        } else {
            Vec::new()
        },
        communities: if options.communities {
            community::detect_communities(network)
        } else {
            Vec::new()
        },
        temporal_distribution: distribution::temporal_distribution(network),
        court_distribution: distribution::court_distribution(network),
        treatment_distribution: distribution::treatment_distribution(network),
        density: distribution::density(network),
        avg_out_degree: distribution::avg_out_degree(network),
    }
}
