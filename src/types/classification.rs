//! Classification result types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::case::CaseRef;

/// Polarity of a treatment signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// The citing case endorses or relies on the cited case.
    Positive,
    /// The citing case undermines the cited case.
    Negative,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// Which text the classifier ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextPass {
    /// Snippet text from search results.
    Snippet,
    /// Full opinion text after escalation.
    FullText,
}

impl TextPass {
    /// Base confidence for a result produced by this pass.
    pub fn base_confidence(&self) -> f64 {
        match self {
            Self::Snippet => 0.70,
            Self::FullText => 0.85,
        }
    }
}

impl fmt::Display for TextPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snippet => write!(f, "snippet"),
            Self::FullText => write!(f, "full_text"),
        }
    }
}

/// Treatment classification of a citing case.
///
/// Negative always wins over positive when both polarities are present
/// (conservative default); `Cited` means the citation was located but no
/// signal matched; `Unknown` means the citation was not found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "polarity", content = "category", rename_all = "snake_case")]
pub enum Treatment {
    /// Negative treatment with the winning signal's category (e.g. "overruled").
    Negative(String),
    /// Positive treatment with the winning signal's category (e.g. "followed").
    Positive(String),
    /// Citation located, no treatment signal matched.
    Cited,
    /// Citation not located in the available text.
    Unknown,
}

impl Treatment {
    /// Polarity of the treatment, if it has one.
    pub fn polarity(&self) -> Option<Polarity> {
        match self {
            Self::Negative(_) => Some(Polarity::Negative),
            Self::Positive(_) => Some(Polarity::Positive),
            Self::Cited | Self::Unknown => None,
        }
    }

    /// Whether this is a negative treatment.
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::Negative(_))
    }

    /// Whether the citation was not located at all.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Category label for distribution bucketing.
    pub fn label(&self) -> &str {
        match self {
            Self::Negative(c) | Self::Positive(c) => c,
            Self::Cited => "cited",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A treatment signal hit recorded during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMatch {
    /// Human-readable signal label, e.g. "overruled by".
    pub signal: String,
    /// Category the signal maps to, e.g. "overruled".
    pub category: String,
    /// Signal polarity.
    pub polarity: Polarity,
    /// Signal weight in [0, 1].
    pub weight: f64,
    /// Lexicon priority rank (lower wins ties).
    pub priority: usize,
    /// Text excerpt surrounding the hit.
    pub excerpt: String,
}

/// Result of classifying one citing case against a target citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The citing case.
    pub case: CaseRef,
    /// Aggregated treatment category.
    pub treatment: Treatment,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Matched signals in scan order.
    pub signals: Vec<SignalMatch>,
    /// Which text pass produced this result.
    pub pass: TextPass,
    /// Both positive and negative signals were present.
    pub mixed_signals: bool,
    /// The classification ran on incomplete data (budget exhausted or
    /// fetch failure prevented escalation).
    pub data_incomplete: bool,
}

impl ClassificationResult {
    /// Build an `Unknown` result (citation not located or text unavailable).
    ///
    /// Unknown confidence is fixed at 0.30 regardless of pass.
    pub fn unknown(case: CaseRef, pass: TextPass) -> Self {
        Self {
            case,
            treatment: Treatment::Unknown,
            confidence: 0.30,
            signals: Vec::new(),
            pass,
            mixed_signals: false,
            data_incomplete: false,
        }
    }

    /// Mark this result as produced from incomplete data.
    pub fn mark_incomplete(mut self) -> Self {
        self.data_incomplete = true;
        self
    }
}
