//! Citation network graph structure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::case::CaseRef;
use super::classification::{ClassificationResult, Treatment};

/// A node in the citation network.
///
/// Created exactly once, the first time its citation is discovered, and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    /// The case this node represents.
    pub case: CaseRef,
    /// Treatment classification. `None` exactly for the root node, which
    /// is trivially "self" and not scored.
    pub classification: Option<ClassificationResult>,
    /// Breadth-first depth from the root (0 = root).
    pub depth: u32,
    /// Court weight multiplier derived from the case's court level.
    pub court_multiplier: f64,
}

impl NetworkNode {
    /// Create the root node.
    pub fn root(case: CaseRef) -> Self {
        let court_multiplier = case.court_level().multiplier();
        Self {
            case,
            classification: None,
            depth: 0,
            court_multiplier,
        }
    }

    /// Create a citing-case node at the given depth.
    pub fn citing(case: CaseRef, classification: ClassificationResult, depth: u32) -> Self {
        let court_multiplier = case.court_level().multiplier();
        Self {
            case,
            classification: Some(classification),
            depth,
            court_multiplier,
        }
    }

    /// Treatment of this node, `Cited` for the unscored root.
    pub fn treatment(&self) -> Treatment {
        self.classification
            .as_ref()
            .map(|c| c.treatment.clone())
            .unwrap_or(Treatment::Cited)
    }
}

/// A directed edge: citing case → cited case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    /// Normalized citation of the citing case.
    pub from: String,
    /// Normalized citation of the cited case.
    pub to: String,
    /// Treatment snapshot taken from the citing node at edge creation.
    pub treatment: Treatment,
    /// Derived influence weight (court multiplier × polarity factor when
    /// the respective toggles are enabled).
    pub weight: f64,
}

/// Soft condition recorded on the network instead of raised as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkWarning {
    /// The node cap was reached; some discovered cases were dropped.
    Truncated,
    /// The run finished with incomplete results (budget exhausted or
    /// cancelled).
    PartialResult {
        /// Why the result is partial.
        reason: String,
    },
    /// A resolver or fetch call failed for one branch after retries.
    UpstreamUnavailable {
        /// Citation of the affected case.
        citation: String,
    },
}

impl fmt::Display for NetworkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "network truncated at node limit"),
            Self::PartialResult { reason } => write!(f, "partial result: {}", reason),
            Self::UpstreamUnavailable { citation } => {
                write!(f, "upstream unavailable for {}", citation)
            }
        }
    }
}

/// A directed citation network produced by one build run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationNetwork {
    /// The root case the network was built around.
    pub root: CaseRef,
    /// Nodes keyed by normalized citation (unique).
    pub nodes: BTreeMap<String, NetworkNode>,
    /// Edges deduplicated by (from, to), sorted by (from, to).
    pub edges: Vec<NetworkEdge>,
    /// Node cap was reached during expansion.
    pub truncated: bool,
    /// Result is incomplete (budget exhausted or cancelled).
    pub partial: bool,
    /// Soft conditions encountered during the build.
    pub warnings: Vec<NetworkWarning>,
}

impl CitationNetwork {
    /// Create a network containing only the root node.
    pub fn new(root: CaseRef) -> Self {
        let mut nodes = BTreeMap::new();
        let root_node = NetworkNode::root(root.clone());
        nodes.insert(root.citation.clone(), root_node);
        Self {
            root,
            nodes,
            edges: Vec::new(),
            truncated: false,
            partial: false,
            warnings: Vec::new(),
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in deterministic iteration order: depth ascending, then
    /// normalized citation ascending.
    pub fn nodes_ordered(&self) -> Vec<&NetworkNode> {
        let mut ordered: Vec<&NetworkNode> = self.nodes.values().collect();
        ordered.sort_by(|a, b| {
            a.depth
                .cmp(&b.depth)
                .then_with(|| a.case.citation.cmp(&b.case.citation))
        });
        ordered
    }

    /// Classified (non-root) nodes in deterministic order.
    pub fn classified_nodes(&self) -> Vec<&NetworkNode> {
        self.nodes_ordered()
            .into_iter()
            .filter(|n| n.classification.is_some())
            .collect()
    }

    /// Whether an edge with this exact ordered (from, to) pair exists.
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.edges.iter().any(|e| e.from == from && e.to == to)
    }

    /// Incoming edge count for a node.
    pub fn in_degree(&self, citation: &str) -> usize {
        self.edges.iter().filter(|e| e.to == citation).count()
    }

    /// Filter the network by treatment labels, minimum confidence, and
    /// filing-date range. The root node is always retained; only nodes
    /// referenced by a surviving edge are kept.
    pub fn filter(&self, criteria: &NetworkFilter) -> CitationNetwork {
        let surviving: Vec<NetworkEdge> = self
            .edges
            .iter()
            .filter(|edge| self.edge_matches(edge, criteria))
            .cloned()
            .collect();

        let mut referenced: BTreeSet<String> = BTreeSet::new();
        referenced.insert(self.root.citation.clone());
        for edge in &surviving {
            referenced.insert(edge.from.clone());
            referenced.insert(edge.to.clone());
        }

        let nodes: BTreeMap<String, NetworkNode> = self
            .nodes
            .iter()
            .filter(|(citation, _)| referenced.contains(*citation))
            .map(|(citation, node)| (citation.clone(), node.clone()))
            .collect();

        CitationNetwork {
            root: self.root.clone(),
            nodes,
            edges: surviving,
            truncated: self.truncated,
            partial: self.partial,
            warnings: self.warnings.clone(),
        }
    }

    fn edge_matches(&self, edge: &NetworkEdge, criteria: &NetworkFilter) -> bool {
        if let Some(treatments) = &criteria.treatments {
            if !treatments.iter().any(|t| t == edge.treatment.label()) {
                return false;
            }
        }

        let citing = match self.nodes.get(&edge.from) {
            Some(node) => node,
            None => return false,
        };

        if let Some(min) = criteria.min_confidence {
            let confidence = citing
                .classification
                .as_ref()
                .map(|c| c.confidence)
                .unwrap_or(0.0);
            if confidence < min {
                return false;
            }
        }

        if let Some(date) = citing.case.date_filed {
            if let Some(after) = criteria.date_after {
                if date < after {
                    return false;
                }
            }
            if let Some(before) = criteria.date_before {
                if date > before {
                    return false;
                }
            }
        }

        true
    }
}

/// Criteria for [`CitationNetwork::filter`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkFilter {
    /// Keep only edges whose treatment label is in this list.
    pub treatments: Option<Vec<String>>,
    /// Keep only edges whose citing node has at least this confidence.
    pub min_confidence: Option<f64>,
    /// Keep only citing cases filed on or after this date.
    pub date_after: Option<NaiveDate>,
    /// Keep only citing cases filed on or before this date.
    pub date_before: Option<NaiveDate>,
}
