//! Citation network construction.
//!
//! Builds a bounded, cycle-safe citation network around a root case by
//! breadth-first expansion. Each level pages through the cases citing the
//! frontier, classifies their treatment from snippets, escalates through
//! the fetch orchestrator, and records nodes and edges. Depth and node
//! caps bound the traversal structurally; re-encountering a known
//! citation adds at most an edge, never a node, so cycles and shared
//! authorities cannot loop or duplicate.
//!
//! Only an unresolvable root or an invalid configuration is fatal.
//! Everything else (failed branches, exhausted budget, cancellation)
//! degrades to warnings on a usable partial network.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::AnalysisCache;
use crate::classifier::TreatmentClassifier;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::fetch::FetchOrchestrator;
use crate::resolver::CitationResolver;
use crate::types::{
    CaseRef, CitationNetwork, ClassificationResult, NetworkEdge, NetworkNode, NetworkWarning,
    TextPass, Treatment,
};

/// Cooperative cancellation handle.
///
/// Cheap to clone; the builder checks it at level and node boundaries and
/// returns the best-effort partial network when it fires.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builds citation networks through a [`CitationResolver`].
pub struct CitationNetworkBuilder<R: CitationResolver + 'static> {
    resolver: Arc<R>,
    classifier: Arc<TreatmentClassifier>,
    config: AnalysisConfig,
    cancel: CancellationFlag,
    cache: Option<Arc<dyn AnalysisCache>>,
}

impl<R: CitationResolver + 'static> CitationNetworkBuilder<R> {
    /// Create a builder with the standard classifier.
    pub fn new(resolver: Arc<R>, config: AnalysisConfig) -> Self {
        Self {
            resolver,
            classifier: Arc::new(TreatmentClassifier::default()),
            config,
            cancel: CancellationFlag::new(),
            cache: None,
        }
    }

    /// Replace the classifier.
    pub fn with_classifier(mut self, classifier: Arc<TreatmentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Attach a cache shared across runs; full opinion texts are served
    /// from it before the resolver is consulted.
    pub fn with_cache(mut self, cache: Arc<dyn AnalysisCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Handle for cancelling an in-flight build.
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Build the citation network around `root_citation`.
    ///
    /// Returns [`AnalysisError::NotFound`] when the root cannot be
    /// resolved and [`AnalysisError::InvalidConfiguration`] when the
    /// configuration is rejected; all other conditions surface as
    /// warnings on the returned network.
    pub async fn build(&self, root_citation: &str) -> Result<CitationNetwork, AnalysisError> {
        self.config.validate()?;

        let root = self
            .resolver
            .lookup_citation(root_citation)
            .await
            .map_err(AnalysisError::from_resolver)?
            .ok_or_else(|| AnalysisError::NotFound(root_citation.to_string()))?;

        info!(citation = %root.citation, max_depth = self.config.max_depth, "building citation network");

        let mut network = CitationNetwork::new(root.clone());
        let mut edges: BTreeMap<(String, String), NetworkEdge> = BTreeMap::new();
        let mut orchestrator = FetchOrchestrator::new(
            Arc::clone(&self.resolver),
            Arc::clone(&self.classifier),
            self.config.fetch_strategy,
            self.config.max_full_text_fetches,
            self.config.fetch_concurrency,
        );
        if let Some(cache) = &self.cache {
            orchestrator = orchestrator.with_cache(Arc::clone(cache));
        }

        let mut frontier = vec![root.citation.clone()];

        for depth in 0..self.config.max_depth {
            if frontier.is_empty() || self.cancel.is_cancelled() {
                break;
            }
            frontier.sort();

            let mut next_frontier = Vec::new();
            for cited_citation in frontier {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.expand_node(
                    &cited_citation,
                    depth + 1,
                    &orchestrator,
                    &mut network,
                    &mut edges,
                    &mut next_frontier,
                )
                .await;
            }
            frontier = next_frontier;
        }

        if self.cancel.is_cancelled() {
            network.partial = true;
            network.warnings.push(NetworkWarning::PartialResult {
                reason: "build cancelled".to_string(),
            });
        }
        if network.truncated {
            network.warnings.push(NetworkWarning::Truncated);
        }

        // BTreeMap keys give (from, to) ascending order.
        network.edges = edges.into_values().collect();

        info!(
            nodes = network.node_count(),
            edges = network.edge_count(),
            truncated = network.truncated,
            partial = network.partial,
            "citation network complete"
        );
        Ok(network)
    }

    /// Expand one frontier node: page citing cases, classify, escalate,
    /// and record nodes and edges for this level.
    async fn expand_node(
        &self,
        cited_citation: &str,
        depth: u32,
        orchestrator: &FetchOrchestrator<R>,
        network: &mut CitationNetwork,
        edges: &mut BTreeMap<(String, String), NetworkEdge>,
        next_frontier: &mut Vec<String>,
    ) {
        let cited_case = match network.nodes.get(cited_citation) {
            Some(node) => node.case.clone(),
            None => return,
        };

        let candidates = match self.collect_citing(cited_citation, network).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(citation = %cited_citation, error = %e, "citing-case resolution failed");
                network.warnings.push(NetworkWarning::UpstreamUnavailable {
                    citation: cited_citation.to_string(),
                });
                return;
            }
        };

        // Known citations get at most a new edge; new citations get a
        // snippet classification and join the escalation batch.
        let mut batch: Vec<(CaseRef, ClassificationResult)> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        for (case, snippet) in candidates {
            if case.citation == cited_citation || seen.contains(&case.citation) {
                continue;
            }
            seen.push(case.citation.clone());

            if let Some(existing) = network.nodes.get(&case.citation) {
                let treatment = existing.treatment();
                let weight = self.edge_weight(existing.court_multiplier, existing);
                self.record_edge(edges, &case.citation, cited_citation, treatment, weight);
                continue;
            }

            let result =
                self.classifier
                    .classify(&snippet, &case, &cited_case, TextPass::Snippet, None);
            batch.push((case, result));
        }

        if batch.is_empty() {
            return;
        }

        let outcome = orchestrator.finalize_batch(&cited_case, batch).await;
        if outcome.budget_exhausted && !network.partial {
            network.partial = true;
            network.warnings.push(NetworkWarning::PartialResult {
                reason: "full-text fetch budget exhausted".to_string(),
            });
        }
        for citation in outcome.failed {
            network
                .warnings
                .push(NetworkWarning::UpstreamUnavailable { citation });
        }

        for state in outcome.states {
            let result = state.into_result();
            if network.node_count() >= self.config.max_nodes {
                debug!(citation = %result.case.citation, "node cap reached, dropping case");
                network.truncated = true;
                continue;
            }

            let case = result.case.clone();
            let treatment = result.treatment.clone();
            let node = NetworkNode::citing(case.clone(), result, depth);
            let weight = self.edge_weight(node.court_multiplier, &node);
            network.nodes.insert(case.citation.clone(), node);
            self.record_edge(edges, &case.citation, cited_citation, treatment, weight);
            next_frontier.push(case.citation);
        }
    }

    /// Page through citing cases for one citation, bounded by the node
    /// cap; marks the network truncated when pages remain past the cap.
    async fn collect_citing(
        &self,
        citation: &str,
        network: &mut CitationNetwork,
    ) -> Result<Vec<(CaseRef, String)>, R::Error> {
        let mut collected = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .resolver
                .find_citing_cases(citation, self.config.page_size, cursor.as_deref())
                .await?;
            for citing in page.cases {
                collected.push((citing.case, citing.snippet));
            }
            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }
            if collected.len() >= self.config.max_nodes {
                network.truncated = true;
                break;
            }
        }
        Ok(collected)
    }

    fn record_edge(
        &self,
        edges: &mut BTreeMap<(String, String), NetworkEdge>,
        from: &str,
        to: &str,
        treatment: Treatment,
        weight: f64,
    ) {
        let key = (from.to_string(), to.to_string());
        edges.entry(key).or_insert_with(|| NetworkEdge {
            from: from.to_string(),
            to: to.to_string(),
            treatment,
            weight,
        });
    }

    /// Edge influence weight: court multiplier times polarity factor,
    /// each gated by its config toggle.
    fn edge_weight(&self, court_multiplier: f64, node: &NetworkNode) -> f64 {
        let court = if self.config.weight_by_court_level {
            court_multiplier
        } else {
            1.0
        };
        let polarity = if self.config.weight_by_treatment_polarity {
            polarity_factor(node)
        } else {
            1.0
        };
        court * polarity
    }
}

/// Polarity factor: positive treatment amplifies (`1 + w`), negative
/// dampens (`max(0.1, 1 - 0.5w)`), where `w` is the winning signal's
/// weight. Neutral treatments leave the weight untouched.
fn polarity_factor(node: &NetworkNode) -> f64 {
    let result = match &node.classification {
        Some(result) => result,
        None => return 1.0,
    };
    let polarity = match result.treatment.polarity() {
        Some(polarity) => polarity,
        None => return 1.0,
    };
    let w = result
        .signals
        .iter()
        .filter(|s| s.polarity == polarity)
        .map(|s| s.weight)
        .fold(0.0, f64::max);
    match result.treatment {
        Treatment::Positive(_) => 1.0 + w,
        Treatment::Negative(_) => (1.0 - 0.5 * w).max(0.1),
        _ => 1.0,
    }
}
