//! Community detection via greedy modularity maximization.
//!
//! Citation direction is irrelevant to "these cases form a doctrinal
//! cluster", so detection runs on the undirected weighted projection of
//! the network. Starting from singleton communities, the pair whose
//! merge yields the largest modularity gain is merged until no merge
//! improves modularity. Ties break lexically on the smallest member
//! citation, keeping the result deterministic.

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::{CitationNetwork, Community};

/// Detect communities in the network.
///
/// Returns communities sorted by descending size (lexical tie-break on
/// the first member), ids assigned after sorting, members sorted
/// ascending. A network without edges yields one singleton community per
/// node.
pub fn detect_communities(network: &CitationNetwork) -> Vec<Community> {
    let citations: Vec<String> = network.nodes.keys().cloned().collect();
    if citations.is_empty() {
        return Vec::new();
    }

    // Undirected projection: parallel directed edges collapse, weights sum.
    let mut adjacency: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    let index: BTreeMap<&str, usize> = citations
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    for edge in &network.edges {
        let (Some(&a), Some(&b)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
        else {
            continue;
        };
        if a == b {
            continue;
        }
        let key = (a.min(b), a.max(b));
        *adjacency.entry(key).or_insert(0.0) += edge.weight;
    }

    let total_weight: f64 = adjacency.values().sum();
    let communities = greedy_merge(citations.len(), &adjacency, total_weight);

    // Materialize with deterministic ordering.
    let mut grouped: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for (node, community) in communities {
        grouped
            .entry(community)
            .or_default()
            .push(citations[node].clone());
    }
    let mut result: Vec<Vec<String>> = grouped
        .into_values()
        .map(|mut members| {
            members.sort();
            members
        })
        .collect();
    result.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

    result
        .into_iter()
        .enumerate()
        .map(|(id, members)| Community { id, members })
        .collect()
}

/// Greedy agglomeration: merge the community pair with the best
/// modularity gain until no positive gain remains. Returns node →
/// community assignments.
fn greedy_merge(
    node_count: usize,
    adjacency: &BTreeMap<(usize, usize), f64>,
    total_weight: f64,
) -> BTreeMap<usize, usize> {
    let mut assignment: BTreeMap<usize, usize> = (0..node_count).map(|n| (n, n)).collect();
    if total_weight <= 0.0 {
        return assignment;
    }

    // Weighted degree per node; community degree is the sum over members.
    let mut degree = vec![0.0; node_count];
    for (&(a, b), &w) in adjacency {
        degree[a] += w;
        degree[b] += w;
    }

    // Community-level state: inter-community weights and degrees.
    let mut between: BTreeMap<(usize, usize), f64> = adjacency.clone();
    let mut community_degree: BTreeMap<usize, f64> =
        (0..node_count).map(|n| (n, degree[n])).collect();

    loop {
        // Pick the connected pair with the best gain. BTreeMap iteration
        // order makes the first-best choice deterministic.
        let mut best: Option<((usize, usize), f64)> = None;
        for (&pair, &weight) in &between {
            let (a, b) = pair;
            let gain = weight / total_weight
                - community_degree[&a] * community_degree[&b] / (2.0 * total_weight * total_weight);
            if gain > best.map(|(_, g)| g).unwrap_or(0.0) + 1e-12 {
                best = Some((pair, gain));
            }
        }
        let Some(((keep, absorb), gain)) = best else {
            break;
        };
        debug!(keep, absorb, gain, "merging communities");

        // Fold `absorb` into `keep`.
        for assigned in assignment.values_mut() {
            if *assigned == absorb {
                *assigned = keep;
            }
        }
        let absorbed_degree = community_degree.remove(&absorb).unwrap_or(0.0);
        if let Some(d) = community_degree.get_mut(&keep) {
            *d += absorbed_degree;
        }

        let mut rebuilt: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (&(a, b), &w) in &between {
            let a = if a == absorb { keep } else { a };
            let b = if b == absorb { keep } else { b };
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            *rebuilt.entry(key).or_insert(0.0) += w;
        }
        between = rebuilt;
    }

    assignment
}
