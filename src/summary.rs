//! Aggregated validity verdict for a network's root case.
//!
//! Only direct citators count: a depth-2 classification describes how
//! that case treats its own cited authority, not the root, so the
//! verdict is computed from the nodes whose edges point at the root.

use serde::{Deserialize, Serialize};

use crate::types::{CitationNetwork, ClassificationResult, Treatment};

/// A negative classification at or above this confidence defeats the
/// good-law presumption.
const CRITICAL_CONFIDENCE: f64 = 0.8;

/// Verdict confidence ceiling; citator verdicts are never certain.
const CONFIDENCE_CAP: f64 = 0.95;

/// The strongest negative treatment found against the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeAuthority {
    /// Citation of the case delivering the treatment.
    pub citing: String,
    /// Treatment category, e.g. "overruled".
    pub category: String,
    /// Classification confidence.
    pub confidence: f64,
}

/// Aggregated treatment verdict for the root case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentSummary {
    /// Root citation the verdict applies to.
    pub citation: String,
    /// No sufficiently confident negative treatment was found.
    pub is_good_law: bool,
    /// Verdict confidence in [0.3, 0.95].
    pub confidence: f64,
    /// Direct citators with negative treatment.
    pub negative_count: usize,
    /// Direct citators with positive treatment.
    pub positive_count: usize,
    /// Strongest negative authority, when any negative treatment exists.
    pub strongest_negative: Option<NegativeAuthority>,
    /// Some direct citator was classified from incomplete data.
    pub data_incomplete: bool,
    /// One-line plain-English verdict.
    pub headline: String,
}

/// Summarize the validity of the network's root case.
pub fn summarize(network: &CitationNetwork) -> TreatmentSummary {
    let direct: Vec<&ClassificationResult> = network
        .edges
        .iter()
        .filter(|e| e.to == network.root.citation)
        .filter_map(|e| network.nodes.get(&e.from))
        .filter_map(|n| n.classification.as_ref())
        .collect();

    let negatives: Vec<&&ClassificationResult> = direct
        .iter()
        .filter(|r| r.treatment.is_negative())
        .collect();
    let negative_count = negatives.len();
    let positive_count = direct
        .iter()
        .filter(|r| matches!(r.treatment, Treatment::Positive(_)))
        .count();
    let data_incomplete = direct.iter().any(|r| r.data_incomplete);

    let strongest_negative = negatives
        .iter()
        .max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.case.citation.cmp(&a.case.citation))
        })
        .map(|r| NegativeAuthority {
            citing: r.case.citation.clone(),
            category: r.treatment.label().to_string(),
            confidence: r.confidence,
        });

    let critical = strongest_negative
        .as_ref()
        .map(|n| n.confidence >= CRITICAL_CONFIDENCE)
        .unwrap_or(false);
    let is_good_law = !critical;

    let mut confidence = if critical {
        strongest_negative
            .as_ref()
            .map(|n| n.confidence)
            .unwrap_or(CRITICAL_CONFIDENCE)
    } else if negative_count > 0 {
        (0.6 - 0.1 * negative_count as f64).max(0.3)
    } else if positive_count >= 3 {
        0.8 + (0.03 * positive_count as f64).min(0.15)
    } else {
        0.7
    };
    confidence = confidence.min(CONFIDENCE_CAP);
    if data_incomplete {
        confidence = (confidence * 0.8).max(0.3);
    }

    let headline = headline(
        is_good_law,
        negative_count,
        positive_count,
        strongest_negative.as_ref(),
    );

    TreatmentSummary {
        citation: network.root.citation.clone(),
        is_good_law,
        confidence,
        negative_count,
        positive_count,
        strongest_negative,
        data_incomplete,
        headline,
    }
}

fn headline(
    is_good_law: bool,
    negative_count: usize,
    positive_count: usize,
    strongest: Option<&NegativeAuthority>,
) -> String {
    if !is_good_law {
        if let Some(n) = strongest {
            return format!("{} by {}", n.category, n.citing);
        }
    }
    if negative_count > 0 {
        format!(
            "questioned validity: {} negative treatment(s) among citing cases",
            negative_count
        )
    } else if positive_count > 0 {
        format!("good law: followed or endorsed by {} citing case(s)", positive_count)
    } else {
        "good law: no significant treatment found".to_string()
    }
}
