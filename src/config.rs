//! Analysis configuration.
//!
//! All knobs the core consumes, validated up front: invalid values are
//! rejected with [`AnalysisError::InvalidConfiguration`] before any
//! building starts.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::fetch::FetchStrategy;

/// Configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// When to escalate a case to a full-text fetch.
    pub fetch_strategy: FetchStrategy,
    /// Global cap on full-text fetches per run.
    pub max_full_text_fetches: usize,
    /// Maximum breadth-first depth from the root.
    pub max_depth: u32,
    /// Maximum number of nodes in the network.
    pub max_nodes: usize,
    /// Page size for citing-case resolution.
    pub page_size: usize,
    /// Concurrency limit for escalated fetches within a batch.
    pub fetch_concurrency: usize,
    /// Compute influence ranking.
    pub enable_advanced_metrics: bool,
    /// Compute communities (costly).
    pub enable_community_detection: bool,
    /// Weight edges by the citing case's court level.
    pub weight_by_court_level: bool,
    /// Weight edges by treatment polarity.
    pub weight_by_treatment_polarity: bool,
}

impl AnalysisConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.max_nodes == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "max_nodes must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.fetch_concurrency == 0 {
            return Err(AnalysisError::InvalidConfiguration(
                "fetch_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fetch_strategy: FetchStrategy::Smart,
            max_full_text_fetches: 10,
            max_depth: 2,
            max_nodes: 100,
            page_size: 20,
            fetch_concurrency: 5,
            enable_advanced_metrics: true,
            enable_community_detection: true,
            weight_by_court_level: true,
            weight_by_treatment_polarity: true,
        }
    }
}
