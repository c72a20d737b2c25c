//! Influence ranking via weighted PageRank.
//!
//! Builds a directed graph where edges point from citing case to cited
//! case, so influence accumulates on the cases that get cited. Each
//! node's rank is distributed across its outgoing edges in proportion to
//! edge weight; dangling nodes (no outgoing edges, the root among them)
//! redistribute their rank uniformly. Scores are normalized to sum to
//! 1.0.

use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use crate::types::{CitationNetwork, InfluenceEntry};

const DAMPING: f64 = 0.85;
const TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 100;

/// Compute the influence ranking for a network.
///
/// Returns entries sorted by descending score; ties break by ascending
/// citation. Empty for networks with fewer than two nodes.
pub fn influence_ranking(network: &CitationNetwork) -> Vec<InfluenceEntry> {
    if network.node_count() < 2 {
        return Vec::new();
    }

    let (graph, index_map) = build_graph(network);
    let ranks = pagerank(&graph);

    let mut entries: Vec<InfluenceEntry> = index_map
        .into_iter()
        .map(|(citation, idx)| InfluenceEntry {
            citation,
            score: ranks[idx.index()],
        })
        .collect();
    entries.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.citation.cmp(&b.citation))
    });
    entries
}

/// Build the weighted citation graph. Node indices follow the network's
/// sorted citation order, keeping iteration deterministic.
fn build_graph(network: &CitationNetwork) -> (DiGraph<(), f64>, BTreeMap<String, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index_map = BTreeMap::new();

    for citation in network.nodes.keys() {
        let idx = graph.add_node(());
        index_map.insert(citation.clone(), idx);
    }
    for edge in &network.edges {
        if let (Some(&from), Some(&to)) = (index_map.get(&edge.from), index_map.get(&edge.to)) {
            graph.add_edge(from, to, edge.weight);
        }
    }

    (graph, index_map)
}

/// Power iteration until the L1 delta drops below tolerance.
fn pagerank(graph: &DiGraph<(), f64>) -> Vec<f64> {
    let n = graph.node_count();
    let uniform = 1.0 / n as f64;

    // Out-weight totals, for weight-proportional distribution.
    let out_weight: Vec<f64> = graph
        .node_indices()
        .map(|idx| {
            graph
                .edges_directed(idx, Direction::Outgoing)
                .map(|e| *e.weight())
                .sum()
        })
        .collect();

    let mut ranks = vec![uniform; n];
    for iteration in 0..MAX_ITERATIONS {
        // Dangling rank teleports uniformly.
        let dangling: f64 = graph
            .node_indices()
            .filter(|idx| out_weight[idx.index()] <= 0.0)
            .map(|idx| ranks[idx.index()])
            .sum();

        let mut next = vec![(1.0 - DAMPING) * uniform + DAMPING * dangling * uniform; n];
        for idx in graph.node_indices() {
            let total = out_weight[idx.index()];
            if total <= 0.0 {
                continue;
            }
            let share = DAMPING * ranks[idx.index()] / total;
            for edge in graph.edges_directed(idx, Direction::Outgoing) {
                next[edge.target().index()] += share * *edge.weight();
            }
        }

        let delta: f64 = ranks
            .iter()
            .zip(&next)
            .map(|(old, new)| (old - new).abs())
            .sum();
        ranks = next;
        if delta < TOLERANCE {
            debug!(iteration, "influence ranking converged");
            break;
        }
    }

    // Normalize; power iteration preserves mass up to float error.
    let total: f64 = ranks.iter().sum();
    if total > 0.0 {
        for rank in &mut ranks {
            *rank /= total;
        }
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CaseRef, CitationNetwork, ClassificationResult, NetworkEdge, NetworkNode, TextPass, Treatment};

    fn make_network(edges: &[(&str, &str, f64)]) -> CitationNetwork {
        let root = CaseRef::new("1 U.S. 1", "Root v. Case", "scotus");
        let mut network = CitationNetwork::new(root.clone());
        for (from, to, weight) in edges {
            for citation in [from, to] {
                if !network.nodes.contains_key(*citation) {
                    let case = CaseRef::new(citation, "Test v. Case", "scotus");
                    let classification = ClassificationResult {
                        case: case.clone(),
                        treatment: Treatment::Cited,
                        confidence: 0.7,
                        signals: Vec::new(),
                        pass: TextPass::Snippet,
                        mixed_signals: false,
                        data_incomplete: false,
                    };
                    network
                        .nodes
                        .insert(citation.to_string(), NetworkNode::citing(case, classification, 1));
                }
            }
            network.edges.push(NetworkEdge {
                from: from.to_string(),
                to: to.to_string(),
                treatment: Treatment::Cited,
                weight: *weight,
            });
        }
        network
    }

    #[test]
    fn test_single_node_has_empty_ranking() {
        let network = CitationNetwork::new(CaseRef::new("1 U.S. 1", "Root", "scotus"));
        assert!(influence_ranking(&network).is_empty());
    }

    #[test]
    fn test_scores_sum_to_one() {
        let network = make_network(&[
            ("2 u.s. 2", "1 u.s. 1", 2.0),
            ("3 u.s. 3", "1 u.s. 1", 1.5),
            ("4 u.s. 4", "2 u.s. 2", 1.0),
        ]);
        let ranking = influence_ranking(&network);
        let total: f64 = ranking.iter().map(|e| e.score).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_most_cited_node_ranks_first() {
        let network = make_network(&[
            ("2 u.s. 2", "1 u.s. 1", 1.0),
            ("3 u.s. 3", "1 u.s. 1", 1.0),
            ("4 u.s. 4", "1 u.s. 1", 1.0),
            ("4 u.s. 4", "2 u.s. 2", 1.0),
        ]);
        let ranking = influence_ranking(&network);
        assert_eq!(ranking[0].citation, "1 u.s. 1");
    }

    #[test]
    fn test_heavier_edge_carries_more_influence() {
        // Same citer splits rank between two targets, weighted 3:1.
        let network = make_network(&[
            ("2 u.s. 2", "1 u.s. 1", 3.0),
            ("2 u.s. 2", "3 u.s. 3", 1.0),
        ]);
        let ranking = influence_ranking(&network);
        let score_of = |citation: &str| {
            ranking
                .iter()
                .find(|e| e.citation == citation)
                .map(|e| e.score)
                .unwrap()
        };
        assert!(score_of("1 u.s. 1") > score_of("3 u.s. 3"));
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let edges = [
            ("2 u.s. 2", "1 u.s. 1", 1.0),
            ("3 u.s. 3", "1 u.s. 1", 1.0),
        ];
        let a = influence_ranking(&make_network(&edges));
        let b = influence_ranking(&make_network(&edges));
        assert_eq!(a, b);
    }
}
