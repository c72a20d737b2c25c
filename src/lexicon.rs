//! Treatment signal lexicon.
//!
//! Static table of treatment phrases with polarity and weight, compiled
//! once at initialization and injected into the classifier. Lexicon order
//! is the fixed priority used to break ties among same-weight signals.

use regex_lite::Regex;

use crate::types::Polarity;

/// Negative phrases: (word-boundary pattern, label, category, weight).
///
/// Weights follow the severity of the treatment: outright reversal of
/// precedent scores 1.0, softer criticism scores lower.
const NEGATIVE_PHRASES: &[(&str, &str, &str, f64)] = &[
    (r"\boverruled\b", "overruled", "overruled", 1.0),
    (r"\babrogated\b", "abrogated", "abrogated", 1.0),
    (
        r"\bno\s+longer\s+good\s+law\b",
        "no longer good law",
        "no longer good law",
        1.0,
    ),
    (r"\boverturned\b", "overturned", "overturned", 1.0),
    (r"\bsuperseded\b", "superseded", "superseded", 0.95),
    (r"\breversed\b", "reversed", "reversed", 0.9),
    (r"\bvacated\b", "vacated", "vacated", 0.9),
    (r"\bdisapproved\b", "disapproved", "disapproved", 0.85),
    (r"\bnot\s+followed\b", "not followed", "not followed", 0.85),
    (r"\brejected\b", "rejected", "rejected", 0.8),
    (r"\bquestioned\b", "questioned", "questioned", 0.7),
    (r"\bcriticized\b", "criticized", "criticized", 0.7),
    (r"\blimited\s+to\b", "limited to", "limited", 0.7),
    // Often neutral in practice, but treated as weak negative.
    (r"\bdistinguished\b", "distinguished", "distinguished", 0.5),
];

/// Positive phrases: (word-boundary pattern, label, category, weight).
const POSITIVE_PHRASES: &[(&str, &str, &str, f64)] = &[
    (r"\bfollowed\b", "followed", "followed", 0.9),
    (r"\baffirmed\b", "affirmed", "affirmed", 0.9),
    (r"\bupheld\b", "upheld", "upheld", 0.9),
    (r"\badopted\b", "adopted", "adopted", 0.85),
    (
        r"\brelied\s+(?:up)?on\b",
        "relied on",
        "relied on",
        0.85,
    ),
    (r"\bconfirmed\b", "confirmed", "confirmed", 0.85),
    (
        r"\bin\s+accord\s+with\b",
        "in accord with",
        "in accord with",
        0.8,
    ),
    (r"\bagree\s+with\b", "agree with", "agree with", 0.8),
    (r"\bapplied\b", "applied", "applied", 0.8),
    (
        r"\bconsistent\s+with\b",
        "consistent with",
        "consistent with",
        0.7,
    ),
    (r"\bsupport(?:s|ed|ing)?\b", "supports", "supports", 0.7),
];

/// A compiled treatment signal.
#[derive(Debug)]
pub struct LexiconSignal {
    /// Human-readable label, e.g. "overruled".
    pub label: &'static str,
    /// Category the signal classifies into.
    pub category: &'static str,
    /// Signal polarity.
    pub polarity: Polarity,
    /// Weight in [0, 1].
    pub weight: f64,
    /// Fixed priority rank (lexicon order, lower wins ties).
    pub priority: usize,
    pattern: Regex,
}

impl LexiconSignal {
    /// Whether the signal matches anywhere in the (already normalized) text.
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Immutable treatment signal lexicon.
///
/// Constructed once and shared; negative signals precede positive signals
/// in priority order, matching the conservative aggregation policy.
#[derive(Debug)]
pub struct SignalLexicon {
    signals: Vec<LexiconSignal>,
}

impl SignalLexicon {
    /// Build the standard lexicon.
    pub fn standard() -> Self {
        let mut signals = Vec::with_capacity(NEGATIVE_PHRASES.len() + POSITIVE_PHRASES.len());

        for (pattern, label, category, weight) in NEGATIVE_PHRASES {
            signals.push(LexiconSignal {
                label,
                category,
                polarity: Polarity::Negative,
                weight: *weight,
                priority: signals.len(),
                // Static patterns, compile failure is a programming error.
                pattern: Regex::new(pattern).expect("static lexicon pattern"),
            });
        }
        for (pattern, label, category, weight) in POSITIVE_PHRASES {
            signals.push(LexiconSignal {
                label,
                category,
                polarity: Polarity::Positive,
                weight: *weight,
                priority: signals.len(),
                pattern: Regex::new(pattern).expect("static lexicon pattern"),
            });
        }

        Self { signals }
    }

    /// All signals in priority order.
    pub fn signals(&self) -> &[LexiconSignal] {
        &self.signals
    }

    /// Signals matching the given (normalized) text window, in priority order.
    pub fn scan<'a>(&'a self, window: &str) -> Vec<&'a LexiconSignal> {
        self.signals.iter().filter(|s| s.matches(window)).collect()
    }

    /// Number of signals in the lexicon.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the lexicon is empty.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl Default for SignalLexicon {
    fn default() -> Self {
        Self::standard()
    }
}
