//! Property-based tests for classification and analytics invariants.

use citegraph::analytics::influence_ranking;
use citegraph::{
    normalize_citation, CaseRef, CitationNetwork, ClassificationResult, NetworkEdge, NetworkNode,
    TextPass, Treatment, TreatmentClassifier,
};
use proptest::prelude::*;

fn target() -> CaseRef {
    CaseRef::new("410 U.S. 113", "Roe v. Wade", "scotus")
}

fn citing() -> CaseRef {
    CaseRef::new("597 U.S. 215", "Dobbs v. Jackson", "scotus")
}

proptest! {
    #[test]
    fn confidence_stays_in_unit_interval(text in ".{0,600}") {
        let classifier = TreatmentClassifier::default();
        let result = classifier.classify(&text, &citing(), &target(), TextPass::Snippet, None);
        prop_assert!(result.confidence >= 0.0);
        prop_assert!(result.confidence <= 1.0);
        if result.treatment.is_negative() {
            prop_assert!(!result.signals.is_empty());
            prop_assert!(result.signals.iter().all(|s| !s.excerpt.is_empty()));
        }
    }

    #[test]
    fn classification_is_idempotent(text in ".{0,600}") {
        let classifier = TreatmentClassifier::default();
        let a = classifier.classify(&text, &citing(), &target(), TextPass::Snippet, None);
        let b = classifier.classify(&text, &citing(), &target(), TextPass::Snippet, None);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn mixed_signals_always_resolve_negative(
        prefix in "[a-z ]{0,40}",
        suffix in "[a-z ]{0,40}",
    ) {
        // Both polarities present around the citation.
        let text = format!("{} 410 u.s. 113 was followed but later overruled {}", prefix, suffix);
        let classifier = TreatmentClassifier::default();
        let result = classifier.classify(&text, &citing(), &target(), TextPass::Snippet, None);
        prop_assert!(result.mixed_signals);
        prop_assert!(result.treatment.is_negative());
    }

    #[test]
    fn citation_normalization_is_idempotent(raw in "\\PC{0,60}") {
        let once = normalize_citation(&raw);
        prop_assert_eq!(normalize_citation(&once), once);
    }

    #[test]
    fn influence_scores_sum_to_one(
        edges in prop::collection::vec((0usize..8, 0usize..8, 0.1f64..3.0), 1..20),
    ) {
        let network = network_from_edges(&edges);
        let ranking = influence_ranking(&network);
        if network.node_count() >= 2 {
            let total: f64 = ranking.iter().map(|e| e.score).sum();
            prop_assert!((total - 1.0).abs() < 1e-6);
            prop_assert!(ranking.iter().all(|e| e.score >= 0.0));
        }
    }
}

/// Build a network from arbitrary (from, to, weight) triples over a small
/// node id space; self-loops are dropped.
fn network_from_edges(edges: &[(usize, usize, f64)]) -> CitationNetwork {
    let root = CaseRef::new("0 U.S. 0", "Root v. Case", "scotus");
    let mut network = CitationNetwork::new(root.clone());

    let citation_of = |id: usize| format!("{} u.s. {}", id, id);
    for &(from, to, _) in edges {
        for id in [from, to] {
            let citation = citation_of(id);
            if network.nodes.contains_key(&citation) {
                continue;
            }
            let case = CaseRef::new(&citation, "Test v. Case", "scotus");
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
                .insert(citation, NetworkNode::citing(case, classification, 1));
        }
    }
    for &(from, to, weight) in edges {
        if from == to {
            continue;
        }
        let (from, to) = (citation_of(from), citation_of(to));
        if !network.contains_edge(&from, &to) {
            network.edges.push(NetworkEdge {
                from,
                to,
                treatment: Treatment::Cited,
                weight,
            });
        }
    }
    network
}
