//! Treatment classifier.
//!
//! Scores a citing case's available text against the signal lexicon to
//! decide how it treats a target case.
//!
//! ## Algorithm
//!
//! 1. Normalize text (strip markup, collapse whitespace, casefold)
//! 2. Locate every occurrence of the target citation and its case-name alias
//! 3. Scan a 400-character window around each occurrence for lexicon phrases
//! 4. Aggregate hits: negative wins over positive (conservative default),
//!    highest weight wins within a polarity, ties broken by lexicon priority
//!
//! Classification is pure computation: no I/O, no suspension, idempotent.

use regex_lite::Regex;

use crate::lexicon::{LexiconSignal, SignalLexicon};
use crate::types::{
    normalize_citation, CaseRef, ClassificationResult, Polarity, SignalMatch, TextPass, Treatment,
};

/// Characters of context taken before and after each citation occurrence.
const CONTEXT_WINDOW: usize = 400;

/// Maximum excerpt length stored per signal match.
const EXCERPT_LEN: usize = 200;

/// Confidence bonus per corroborating same-polarity hit beyond the first.
const CORROBORATION_BONUS: f64 = 0.05;

/// Confidence bonus when citation and case-name alias both matched.
const ALIAS_BONUS: f64 = 0.10;

/// Classifier for determining how citing cases treat a target case.
pub struct TreatmentClassifier {
    lexicon: SignalLexicon,
    markup: Regex,
}

impl TreatmentClassifier {
    /// Create a classifier with the given lexicon.
    pub fn new(lexicon: SignalLexicon) -> Self {
        Self {
            lexicon,
            markup: Regex::new(r"<[^>]*>").expect("static markup pattern"),
        }
    }

    /// The injected lexicon.
    pub fn lexicon(&self) -> &SignalLexicon {
        &self.lexicon
    }

    /// Classify how `citing` treats `target` based on the given text.
    ///
    /// `prior` is the snippet-pass result for the same case, if any. It is
    /// consulted only when the escalated text does not contain the target
    /// citation at all; in that case the prior result stands. Otherwise the
    /// new result replaces the prior entirely.
    pub fn classify(
        &self,
        text: &str,
        citing: &CaseRef,
        target: &CaseRef,
        pass: TextPass,
        prior: Option<&ClassificationResult>,
    ) -> ClassificationResult {
        let normalized = self.normalize(text);
        if normalized.is_empty() {
            return self.fall_back(citing.clone(), pass, prior);
        }

        let citation = normalize_citation(&target.citation);
        let alias = normalize_citation(&target.case_name);

        let citation_spans = find_occurrences(&normalized, &citation);
        let alias_spans = if alias.len() >= 3 && alias != citation {
            find_occurrences(&normalized, &alias)
        } else {
            Vec::new()
        };

        if citation_spans.is_empty() && alias_spans.is_empty() {
            return self.fall_back(citing.clone(), pass, prior);
        }
        let both_matched = !citation_spans.is_empty() && !alias_spans.is_empty();

        let mut signals: Vec<SignalMatch> = Vec::new();
        let mut spans = citation_spans;
        spans.extend(alias_spans);
        for (start, end) in spans {
            let window = context_window(&normalized, start, end);
            for hit in self.lexicon.scan(window) {
                signals.push(to_match(hit, window));
            }
        }

        let (treatment, mixed_signals) = aggregate(&signals);
        let confidence = self.confidence(pass, &treatment, &signals, both_matched);

        ClassificationResult {
            case: citing.clone(),
            treatment,
            confidence,
            signals,
            pass,
            mixed_signals,
            data_incomplete: false,
        }
    }

    /// Normalize text for matching: strip markup, collapse whitespace,
    /// casefold.
    fn normalize(&self, text: &str) -> String {
        let stripped = self.markup.replace_all(text, " ");
        stripped
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Unknown result, unless a prior pass already located the citation.
    fn fall_back(
        &self,
        citing: CaseRef,
        pass: TextPass,
        prior: Option<&ClassificationResult>,
    ) -> ClassificationResult {
        match prior {
            Some(prior) if !prior.treatment.is_unknown() => prior.clone(),
            _ => ClassificationResult::unknown(citing, pass),
        }
    }

    fn confidence(
        &self,
        pass: TextPass,
        treatment: &Treatment,
        signals: &[SignalMatch],
        both_matched: bool,
    ) -> f64 {
        if treatment.is_unknown() {
            return 0.30;
        }
        let mut confidence = pass.base_confidence();
        if let Some(polarity) = treatment.polarity() {
            let corroborating = signals.iter().filter(|s| s.polarity == polarity).count();
            confidence += CORROBORATION_BONUS * corroborating.saturating_sub(1) as f64;
        }
        if both_matched {
            confidence += ALIAS_BONUS;
        }
        confidence.min(1.0)
    }
}

impl Default for TreatmentClassifier {
    fn default() -> Self {
        Self::new(SignalLexicon::standard())
    }
}

/// Aggregate matched signals into a treatment category.
///
/// Negative hits take precedence; within a polarity the highest weight
/// wins, ties broken by fixed lexicon priority (never by position).
fn aggregate(signals: &[SignalMatch]) -> (Treatment, bool) {
    let strongest = |polarity: Polarity| {
        signals
            .iter()
            .filter(|s| s.polarity == polarity)
            .min_by(|a, b| {
                b.weight
                    .partial_cmp(&a.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.priority.cmp(&b.priority))
            })
    };

    let negative = strongest(Polarity::Negative);
    let positive = strongest(Polarity::Positive);
    let mixed = negative.is_some() && positive.is_some();

    let treatment = if let Some(hit) = negative {
        Treatment::Negative(hit.category.clone())
    } else if let Some(hit) = positive {
        Treatment::Positive(hit.category.clone())
    } else {
        Treatment::Cited
    };

    (treatment, mixed)
}

fn to_match(signal: &LexiconSignal, window: &str) -> SignalMatch {
    SignalMatch {
        signal: signal.label.to_string(),
        category: signal.category.to_string(),
        polarity: signal.polarity,
        weight: signal.weight,
        priority: signal.priority,
        excerpt: truncate_chars(window, EXCERPT_LEN).to_string(),
    }
}

/// Byte spans of every occurrence of `needle` in `haystack`.
fn find_occurrences(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack
        .match_indices(needle)
        .map(|(i, m)| (i, i + m.len()))
        .collect()
}

/// Context window of `CONTEXT_WINDOW` characters around a span, truncated
/// at text boundaries and snapped to char boundaries.
fn context_window(text: &str, start: usize, end: usize) -> &str {
    let from = floor_char_boundary(text, start.saturating_sub(CONTEXT_WINDOW));
    let to = ceil_char_boundary(text, (end + CONTEXT_WINDOW).min(text.len()));
    &text[from..to]
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TreatmentClassifier {
        TreatmentClassifier::default()
    }

    fn target() -> CaseRef {
        CaseRef::new("410 U.S. 113", "Roe v. Wade", "scotus")
    }

    fn citing() -> CaseRef {
        CaseRef::new("597 U.S. 215", "Dobbs v. Jackson", "scotus")
    }

    #[test]
    fn test_overruled_within_window() {
        let text = "We hold that 410 U.S. 113 is overruled by this decision.";
        let result = classifier().classify(text, &citing(), &target(), TextPass::Snippet, None);

        assert_eq!(result.treatment, Treatment::Negative("overruled".into()));
        assert!(result.confidence >= 0.70);
        assert!(!result.signals.is_empty());
        assert!(result.signals[0].excerpt.contains("overruled"));
    }

    #[test]
    fn test_full_text_pass_higher_confidence() {
        let text = "We hold that 410 U.S. 113 is overruled.";
        let snippet = classifier().classify(text, &citing(), &target(), TextPass::Snippet, None);
        let full = classifier().classify(text, &citing(), &target(), TextPass::FullText, None);

        assert!(snippet.confidence >= 0.70);
        assert!(full.confidence >= 0.85);
        assert!(full.confidence > snippet.confidence);
    }

    #[test]
    fn test_positive_treatment() {
        let text = "The reasoning of 410 U.S. 113 was followed by this court.";
        let result = classifier().classify(text, &citing(), &target(), TextPass::Snippet, None);

        assert_eq!(result.treatment, Treatment::Positive("followed".into()));
        assert!(!result.mixed_signals);
    }

    #[test]
    fn test_negative_wins_mixed_signals() {
        let text = "Although 410 U.S. 113 was followed for years, it is now overruled.";
        let result = classifier().classify(text, &citing(), &target(), TextPass::Snippet, None);

        assert_eq!(result.treatment, Treatment::Negative("overruled".into()));
        assert!(result.mixed_signals);
    }

    #[test]
    fn test_cited_without_signals() {
        let text = "See 410 U.S. 113 for the relevant procedural history.";
        let result = classifier().classify(text, &citing(), &target(), TextPass::Snippet, None);

        assert_eq!(result.treatment, Treatment::Cited);
        assert!(result.signals.is_empty());
    }

    #[test]
    fn test_citation_not_found() {
        let text = "This opinion discusses entirely unrelated matters.";
        let result = classifier().classify(text, &citing(), &target(), TextPass::Snippet, None);

        assert_eq!(result.treatment, Treatment::Unknown);
        assert_eq!(result.confidence, 0.30);
    }

    #[test]
    fn test_empty_text_is_unknown() {
        let result = classifier().classify("", &citing(), &target(), TextPass::Snippet, None);
        assert_eq!(result.treatment, Treatment::Unknown);
        assert_eq!(result.confidence, 0.30);
    }

    #[test]
    fn test_alias_match_bonus() {
        let with_alias =
            "Roe v. Wade, 410 U.S. 113, is overruled; Roe v. Wade no longer controls.";
        let without_alias = "410 U.S. 113 is overruled.";
        let c = classifier();

        let a = c.classify(with_alias, &citing(), &target(), TextPass::Snippet, None);
        let b = c.classify(without_alias, &citing(), &target(), TextPass::Snippet, None);
        assert!(a.confidence > b.confidence);
    }

    #[test]
    fn test_signal_outside_window_ignored() {
        // Pad so "overruled" sits more than 400 chars away from the citation.
        let padding = "lorem ipsum ".repeat(60);
        let text = format!("The case 410 U.S. 113 settled the issue. {} overruled", padding);
        let result = classifier().classify(&text, &citing(), &target(), TextPass::Snippet, None);

        assert_eq!(result.treatment, Treatment::Cited);
    }

    #[test]
    fn test_citation_at_text_boundary() {
        // Citation at the very start: truncated window, never an error.
        let text = "410 U.S. 113 was overruled.";
        let result = classifier().classify(text, &citing(), &target(), TextPass::Snippet, None);
        assert_eq!(result.treatment, Treatment::Negative("overruled".into()));
    }

    #[test]
    fn test_markup_stripped() {
        let text = "<p>We conclude that <em>410 U.S. 113</em> is <b>overruled</b>.</p>";
        let result = classifier().classify(text, &citing(), &target(), TextPass::Snippet, None);
        assert_eq!(result.treatment, Treatment::Negative("overruled".into()));
    }

    #[test]
    fn test_idempotence() {
        let text = "Although 410 U.S. 113 was followed for years, it is now overruled.";
        let c = classifier();
        let a = c.classify(text, &citing(), &target(), TextPass::Snippet, None);
        let b = c.classify(text, &citing(), &target(), TextPass::Snippet, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_weight_tie_broken_by_lexicon_priority() {
        // "questioned" and "criticized" both weigh 0.7; "questioned" has the
        // lower lexicon index and must win.
        let text = "410 U.S. 113 has been criticized and questioned by later panels.";
        let result = classifier().classify(text, &citing(), &target(), TextPass::Snippet, None);
        assert_eq!(result.treatment, Treatment::Negative("questioned".into()));
    }

    #[test]
    fn test_corroboration_increases_confidence() {
        let single = "410 U.S. 113 is overruled.";
        let double = "410 U.S. 113 is overruled; it was also abrogated.";
        let c = classifier();

        let a = c.classify(single, &citing(), &target(), TextPass::Snippet, None);
        let b = c.classify(double, &citing(), &target(), TextPass::Snippet, None);
        assert!(b.confidence > a.confidence);
    }

    #[test]
    fn test_prior_result_stands_when_citation_absent() {
        let c = classifier();
        let snippet_text = "410 U.S. 113 is overruled.";
        let prior = c.classify(snippet_text, &citing(), &target(), TextPass::Snippet, None);

        // Full text (e.g. wrong opinion body) without the citation.
        let full_text = "Nothing relevant here.";
        let result = c.classify(full_text, &citing(), &target(), TextPass::FullText, Some(&prior));
        assert_eq!(result, prior);
    }

    #[test]
    fn test_full_text_replaces_prior() {
        let c = classifier();
        let prior = c.classify(
            "410 U.S. 113 is questioned.",
            &citing(),
            &target(),
            TextPass::Snippet,
            None,
        );
        let result = c.classify(
            "On full review, 410 U.S. 113 is overruled.",
            &citing(),
            &target(),
            TextPass::FullText,
            Some(&prior),
        );
        assert_eq!(result.treatment, Treatment::Negative("overruled".into()));
        assert_eq!(result.pass, TextPass::FullText);
    }

    #[test]
    fn test_confidence_always_in_unit_interval() {
        let c = classifier();
        // Many corroborating hits should cap at 1.0.
        let text = "Roe v. Wade, 410 U.S. 113, was overruled, abrogated, overturned, \
                    reversed, vacated, superseded, disapproved, rejected and questioned.";
        let result = c.classify(text, &citing(), &target(), TextPass::FullText, None);
        assert!(result.confidence <= 1.0);
        assert!(result.confidence >= 0.0);
    }
}
