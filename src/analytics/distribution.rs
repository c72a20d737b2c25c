//! Distribution and shape metrics.

use std::collections::BTreeMap;

use crate::types::CitationNetwork;

/// Classified-node counts per treatment category label.
pub fn treatment_distribution(network: &CitationNetwork) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for node in network.classified_nodes() {
        *counts.entry(node.treatment().label().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Classified-node counts per filing year; undated cases are skipped.
pub fn temporal_distribution(network: &CitationNetwork) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for node in network.classified_nodes() {
        if let Some(year) = node.case.filing_year() {
            *counts.entry(year).or_insert(0) += 1;
        }
    }
    counts
}

/// Classified-node counts per court level label.
pub fn court_distribution(network: &CitationNetwork) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for node in network.classified_nodes() {
        *counts
            .entry(node.case.court_level().to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// Directed density: |edges| / (|nodes| × (|nodes| − 1)), 0 when the
/// denominator degenerates.
pub fn density(network: &CitationNetwork) -> f64 {
    let n = network.node_count() as f64;
    let possible = n * (n - 1.0);
    if possible <= 0.0 {
        0.0
    } else {
        network.edge_count() as f64 / possible
    }
}

/// Average out-degree: |edges| / |nodes|.
pub fn avg_out_degree(network: &CitationNetwork) -> f64 {
    let n = network.node_count();
    if n == 0 {
        0.0
    } else {
        network.edge_count() as f64 / n as f64
    }
}
