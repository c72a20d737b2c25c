//! Fetch orchestration: two-pass escalation under a global budget.
//!
//! Every candidate is first classified from its snippet. The orchestrator
//! then decides, per the configured strategy and the remaining budget,
//! whether to fetch the full opinion text and re-classify. Escalated
//! fetches within a batch run concurrently up to a configured limit;
//! completion order never affects the outcome because each case is
//! re-classified independently and results are keyed by batch position.
//!
//! Per-case processing is an explicit state machine:
//!
//! ```text
//! Unclassified → SnippetClassified → Escalating → FullTextClassified
//!                       │                 │
//!                       │                 └→ FetchFailed (snippet kept)
//!                       └→ BudgetExhausted (snippet kept)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::cache::{AnalysisCache, CacheNamespace};
use crate::classifier::TreatmentClassifier;
use crate::resolver::CitationResolver;
use crate::types::{CaseRef, ClassificationResult, TextPass};

/// When to escalate a case to a full-text fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Escalate every case.
    Always,
    /// Escalate negative, low-confidence, or unknown classifications.
    Smart,
    /// Escalate only negative classifications.
    NegativeOnly,
    /// Never escalate.
    Never,
}

impl FetchStrategy {
    /// Whether the initial result warrants a full-text fetch.
    pub fn should_escalate(&self, initial: &ClassificationResult) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::NegativeOnly => initial.treatment.is_negative(),
            Self::Smart => {
                initial.treatment.is_negative()
                    || initial.confidence < 0.6
                    || initial.treatment.is_unknown()
            }
        }
    }
}

impl Default for FetchStrategy {
    fn default() -> Self {
        Self::Smart
    }
}

impl FromStr for FetchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "smart" => Ok(Self::Smart),
            "negative_only" => Ok(Self::NegativeOnly),
            "never" => Ok(Self::Never),
            other => Err(format!("unknown fetch strategy: {}", other)),
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::Smart => write!(f, "smart"),
            Self::NegativeOnly => write!(f, "negative_only"),
            Self::Never => write!(f, "never"),
        }
    }
}

/// Global full-text fetch budget for one analysis run.
#[derive(Debug, Clone)]
pub struct FetchBudget {
    max: usize,
    used: usize,
}

impl FetchBudget {
    /// Create a budget with the given cap.
    pub fn new(max: usize) -> Self {
        Self { max, used: 0 }
    }

    /// Remaining fetches.
    pub fn remaining(&self) -> usize {
        self.max.saturating_sub(self.used)
    }

    /// Whether the budget is exhausted.
    pub fn exhausted(&self) -> bool {
        self.used >= self.max
    }

    /// Consume one fetch if any remain.
    pub fn try_acquire(&mut self) -> bool {
        if self.exhausted() {
            false
        } else {
            self.used += 1;
            true
        }
    }
}

/// Terminal escalation state of one case in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum EscalationState {
    /// Strategy did not warrant escalation; snippet result is final.
    SnippetClassified(ClassificationResult),
    /// Full text fetched and re-classified; replaces the snippet result.
    FullTextClassified(ClassificationResult),
    /// Escalation warranted but the budget was exhausted; snippet result
    /// kept, flagged incomplete.
    BudgetExhausted(ClassificationResult),
    /// Full-text fetch failed or text was absent; snippet result kept,
    /// flagged incomplete.
    FetchFailed(ClassificationResult),
}

impl EscalationState {
    /// The final classification for this case.
    pub fn into_result(self) -> ClassificationResult {
        match self {
            Self::SnippetClassified(r)
            | Self::FullTextClassified(r)
            | Self::BudgetExhausted(r)
            | Self::FetchFailed(r) => r,
        }
    }

    /// Whether this state carries incomplete data.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::BudgetExhausted(_) | Self::FetchFailed(_))
    }
}

/// Outcome of finalizing one batch of snippet-classified candidates.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Terminal state per candidate, in discovery order.
    pub states: Vec<EscalationState>,
    /// The budget ran out while processing this batch.
    pub budget_exhausted: bool,
    /// Citations whose full-text fetch failed upstream.
    pub failed: Vec<String>,
}

/// Orchestrates the two-pass escalation policy for one analysis run.
///
/// Budget accounting happens sequentially in discovery order; only the
/// fetches themselves overlap. Candidate citations within a batch are
/// unique (the builder dedups before classification) and nodes are never
/// re-escalated, so at most one fetch is ever in flight per citation key;
/// the opinion-text memo additionally collapses repeat fetches for
/// opinions shared across batches.
pub struct FetchOrchestrator<R: CitationResolver> {
    resolver: Arc<R>,
    classifier: Arc<TreatmentClassifier>,
    strategy: FetchStrategy,
    semaphore: Arc<Semaphore>,
    budget: Mutex<FetchBudget>,
    text_memo: Mutex<HashMap<String, Option<String>>>,
    cache: Option<Arc<dyn AnalysisCache>>,
}

impl<R: CitationResolver + 'static> FetchOrchestrator<R> {
    /// Create an orchestrator.
    pub fn new(
        resolver: Arc<R>,
        classifier: Arc<TreatmentClassifier>,
        strategy: FetchStrategy,
        max_fetches: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            classifier,
            strategy,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            budget: Mutex::new(FetchBudget::new(max_fetches)),
            text_memo: Mutex::new(HashMap::new()),
            cache: None,
        }
    }

    /// Attach a cache; fetched opinion texts are read from and written to
    /// the [`CacheNamespace::Text`] namespace.
    pub fn with_cache(mut self, cache: Arc<dyn AnalysisCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The configured strategy.
    pub fn strategy(&self) -> FetchStrategy {
        self.strategy
    }

    /// Remaining fetch budget.
    pub fn budget_remaining(&self) -> usize {
        self.budget.lock().remaining()
    }

    /// Whether the initial result should be escalated, irrespective of
    /// budget.
    pub fn should_escalate(&self, initial: &ClassificationResult) -> bool {
        self.strategy.should_escalate(initial)
    }

    /// Finalize a batch of snippet-classified candidates.
    ///
    /// Decides escalation per candidate in discovery order, runs the
    /// warranted fetches concurrently, and returns terminal states in the
    /// same order the candidates arrived.
    pub async fn finalize_batch(
        &self,
        target: &CaseRef,
        batch: Vec<(CaseRef, ClassificationResult)>,
    ) -> BatchOutcome {
        // Sequential decisions: budget is consumed in discovery order.
        let mut decisions: Vec<Option<EscalationState>> = Vec::with_capacity(batch.len());
        let mut escalations: Vec<(usize, CaseRef, ClassificationResult)> = Vec::new();
        let mut budget_exhausted = false;

        for (idx, (case, initial)) in batch.into_iter().enumerate() {
            if !self.should_escalate(&initial) {
                decisions.push(Some(EscalationState::SnippetClassified(initial)));
                continue;
            }
            if self.budget.lock().try_acquire() {
                debug!(citation = %case.citation, "escalating to full text");
                escalations.push((idx, case, initial));
                decisions.push(None);
            } else {
                budget_exhausted = true;
                decisions.push(Some(EscalationState::BudgetExhausted(
                    initial.mark_incomplete(),
                )));
            }
        }

        // Concurrent fetches, bounded by the semaphore; completion order
        // does not matter because results are placed by batch index.
        let fetches = escalations
            .into_iter()
            .map(|(idx, case, initial)| self.escalate(idx, case, initial, target));
        let completed = futures::future::join_all(fetches).await;

        let mut failed = Vec::new();
        for (idx, state, fetch_failed) in completed {
            if fetch_failed {
                if let EscalationState::FetchFailed(r) = &state {
                    failed.push(r.case.citation.clone());
                }
            }
            decisions[idx] = Some(state);
        }

        let states = decisions
            .into_iter()
            .map(|s| s.unwrap_or_else(|| unreachable!("every batch slot is finalized")))
            .collect();

        BatchOutcome {
            states,
            budget_exhausted,
            failed,
        }
    }

    /// Fetch full text for one case and re-classify.
    ///
    /// Returns (batch index, terminal state, upstream fetch failed).
    async fn escalate(
        &self,
        idx: usize,
        case: CaseRef,
        initial: ClassificationResult,
        target: &CaseRef,
    ) -> (usize, EscalationState, bool) {
        let permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return (idx, EscalationState::FetchFailed(initial.mark_incomplete()), false);
            }
        };

        let opinion_id = match &case.opinion_id {
            Some(id) => id.clone(),
            None => {
                debug!(citation = %case.citation, "no opinion id, keeping snippet result");
                return (idx, EscalationState::FetchFailed(initial.mark_incomplete()), false);
            }
        };

        let text = match self.fetch_text(&opinion_id).await {
            Ok(text) => text,
            Err(e) => {
                warn!(citation = %case.citation, error = %e, "full-text fetch failed");
                drop(permit);
                return (idx, EscalationState::FetchFailed(initial.mark_incomplete()), true);
            }
        };
        drop(permit);

        match text {
            Some(text) => {
                let result = self.classifier.classify(
                    &text,
                    &case,
                    target,
                    TextPass::FullText,
                    Some(&initial),
                );
                (idx, EscalationState::FullTextClassified(result), false)
            }
            None => (idx, EscalationState::FetchFailed(initial.mark_incomplete()), false),
        }
    }

    /// Full-text fetch by opinion id: per-run memo first, then the shared
    /// cache's text namespace, then the resolver (populating both).
    async fn fetch_text(&self, opinion_id: &str) -> Result<Option<String>, R::Error> {
        if let Some(memoized) = self.text_memo.lock().get(opinion_id) {
            return Ok(memoized.clone());
        }
        if let Some(cache) = &self.cache {
            if let Some(text) = cache.get(CacheNamespace::Text, opinion_id).await {
                debug!(opinion_id, "full text served from cache");
                self.text_memo
                    .lock()
                    .insert(opinion_id.to_string(), Some(text.clone()));
                return Ok(Some(text));
            }
        }
        let text = self.resolver.opinion_full_text(opinion_id).await?;
        if let (Some(cache), Some(text)) = (&self.cache, &text) {
            cache
                .set(CacheNamespace::Text, opinion_id, text.clone())
                .await;
        }
        self.text_memo
            .lock()
            .insert(opinion_id.to_string(), text.clone());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::InMemoryResolver;
    use crate::types::Treatment;

    fn make_result(treatment: Treatment, confidence: f64) -> ClassificationResult {
        ClassificationResult {
            case: CaseRef::new("2 U.S. 2", "A v. B", "scotus"),
            treatment,
            confidence,
            signals: Vec::new(),
            pass: TextPass::Snippet,
            mixed_signals: false,
            data_incomplete: false,
        }
    }

    #[test]
    fn test_strategy_table() {
        let negative = make_result(Treatment::Negative("overruled".into()), 0.9);
        let positive = make_result(Treatment::Positive("followed".into()), 0.9);
        let low_confidence = make_result(Treatment::Cited, 0.5);
        let unknown = make_result(Treatment::Unknown, 0.3);

        assert!(FetchStrategy::Always.should_escalate(&positive));
        assert!(!FetchStrategy::Never.should_escalate(&negative));
        assert!(FetchStrategy::NegativeOnly.should_escalate(&negative));
        assert!(!FetchStrategy::NegativeOnly.should_escalate(&positive));
        assert!(FetchStrategy::Smart.should_escalate(&negative));
        assert!(FetchStrategy::Smart.should_escalate(&low_confidence));
        assert!(FetchStrategy::Smart.should_escalate(&unknown));
        assert!(!FetchStrategy::Smart.should_escalate(&positive));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "negative_only".parse::<FetchStrategy>().unwrap(),
            FetchStrategy::NegativeOnly
        );
        assert_eq!("SMART".parse::<FetchStrategy>().unwrap(), FetchStrategy::Smart);
        assert!("bogus".parse::<FetchStrategy>().is_err());
    }

    #[test]
    fn test_budget_accounting() {
        let mut budget = FetchBudget::new(2);
        assert_eq!(budget.remaining(), 2);
        assert!(budget.try_acquire());
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());
        assert!(budget.exhausted());
    }

    fn make_orchestrator(
        resolver: InMemoryResolver,
        strategy: FetchStrategy,
        max_fetches: usize,
    ) -> FetchOrchestrator<InMemoryResolver> {
        FetchOrchestrator::new(
            Arc::new(resolver),
            Arc::new(TreatmentClassifier::default()),
            strategy,
            max_fetches,
            5,
        )
    }

    fn target() -> CaseRef {
        CaseRef::new("410 U.S. 113", "Roe v. Wade", "scotus")
    }

    fn snippet_result(
        classifier: &TreatmentClassifier,
        case: &CaseRef,
        snippet: &str,
    ) -> ClassificationResult {
        classifier.classify(snippet, case, &target(), TextPass::Snippet, None)
    }

    #[tokio::test]
    async fn test_never_strategy_issues_no_fetches() {
        let mut resolver = InMemoryResolver::new();
        resolver.add_full_text("op-1", "410 u.s. 113 is overruled");
        let resolver = Arc::new(resolver);
        let orchestrator = FetchOrchestrator::new(
            Arc::clone(&resolver),
            Arc::new(TreatmentClassifier::default()),
            FetchStrategy::Never,
            10,
            5,
        );

        let classifier = TreatmentClassifier::default();
        let case = CaseRef::new("2 U.S. 2", "A v. B", "scotus").with_opinion_id("op-1");
        let initial = snippet_result(&classifier, &case, "410 U.S. 113 is overruled");

        let outcome = orchestrator
            .finalize_batch(&target(), vec![(case, initial)])
            .await;

        assert_eq!(resolver.full_text_fetches(), 0);
        assert!(matches!(
            outcome.states[0],
            EscalationState::SnippetClassified(_)
        ));
    }

    #[tokio::test]
    async fn test_escalation_replaces_snippet_result() {
        let mut resolver = InMemoryResolver::new();
        resolver.add_full_text(
            "op-1",
            "On full review we conclude 410 U.S. 113 is overruled.",
        );
        let orchestrator = make_orchestrator(resolver, FetchStrategy::Smart, 10);

        let classifier = TreatmentClassifier::default();
        let case = CaseRef::new("2 U.S. 2", "A v. B", "scotus").with_opinion_id("op-1");
        // Snippet only questions the case; full text overrules it.
        let initial = snippet_result(&classifier, &case, "410 U.S. 113 is questioned");

        let outcome = orchestrator
            .finalize_batch(&target(), vec![(case, initial)])
            .await;

        match &outcome.states[0] {
            EscalationState::FullTextClassified(result) => {
                assert_eq!(result.treatment, Treatment::Negative("overruled".into()));
                assert_eq!(result.pass, TextPass::FullText);
                assert!(result.confidence >= 0.85);
            }
            other => panic!("expected full-text classification, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_budget_exhaustion_flags_incomplete() {
        let mut resolver = InMemoryResolver::new();
        for i in 0..3 {
            resolver.add_full_text(&format!("op-{}", i), "410 u.s. 113 is overruled.");
        }
        let orchestrator = make_orchestrator(resolver, FetchStrategy::Smart, 1);

        let classifier = TreatmentClassifier::default();
        let batch: Vec<(CaseRef, ClassificationResult)> = (0..3)
            .map(|i| {
                let case = CaseRef::new(&format!("{} U.S. {}", i + 2, i + 2), "A v. B", "scotus")
                    .with_opinion_id(&format!("op-{}", i));
                let initial = snippet_result(&classifier, &case, "410 U.S. 113 is questioned");
                (case, initial)
            })
            .collect();

        let outcome = orchestrator.finalize_batch(&target(), batch).await;

        assert!(outcome.budget_exhausted);
        assert!(matches!(
            outcome.states[0],
            EscalationState::FullTextClassified(_)
        ));
        for state in &outcome.states[1..] {
            assert!(state.is_incomplete());
            assert!(state.clone().into_result().data_incomplete);
        }
    }

    #[tokio::test]
    async fn test_absent_text_keeps_snippet() {
        let resolver = InMemoryResolver::new(); // no full texts registered
        let orchestrator = make_orchestrator(resolver, FetchStrategy::Smart, 10);

        let classifier = TreatmentClassifier::default();
        let case = CaseRef::new("2 U.S. 2", "A v. B", "scotus").with_opinion_id("op-1");
        let initial = snippet_result(&classifier, &case, "410 U.S. 113 is questioned");
        let expected_treatment = initial.treatment.clone();

        let outcome = orchestrator
            .finalize_batch(&target(), vec![(case, initial)])
            .await;

        match &outcome.states[0] {
            EscalationState::FetchFailed(result) => {
                assert_eq!(result.treatment, expected_treatment);
                assert!(result.data_incomplete);
            }
            other => panic!("expected fetch-failed state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cached_text_avoids_resolver_fetch() {
        use crate::cache::InMemoryCache;

        // Resolver holds no texts; the cache alone must satisfy escalation.
        let resolver = Arc::new(InMemoryResolver::new());
        let cache: Arc<dyn AnalysisCache> = Arc::new(InMemoryCache::default());
        cache
            .set(
                CacheNamespace::Text,
                "op-1",
                "On review, 410 u.s. 113 is overruled.".to_string(),
            )
            .await;
        let orchestrator = FetchOrchestrator::new(
            Arc::clone(&resolver),
            Arc::new(TreatmentClassifier::default()),
            FetchStrategy::Smart,
            10,
            5,
        )
        .with_cache(cache);

        let classifier = TreatmentClassifier::default();
        let case = CaseRef::new("2 U.S. 2", "A v. B", "scotus").with_opinion_id("op-1");
        let initial = snippet_result(&classifier, &case, "410 U.S. 113 is questioned");

        let outcome = orchestrator
            .finalize_batch(&target(), vec![(case, initial)])
            .await;

        assert_eq!(resolver.full_text_fetches(), 0);
        match &outcome.states[0] {
            EscalationState::FullTextClassified(result) => {
                assert_eq!(result.treatment, Treatment::Negative("overruled".into()));
            }
            other => panic!("expected full-text classification, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetched_text_is_written_to_cache() {
        use crate::cache::InMemoryCache;

        let mut resolver = InMemoryResolver::new();
        resolver.add_full_text("op-1", "410 u.s. 113 is overruled.");
        let cache: Arc<dyn AnalysisCache> = Arc::new(InMemoryCache::default());
        let orchestrator = FetchOrchestrator::new(
            Arc::new(resolver),
            Arc::new(TreatmentClassifier::default()),
            FetchStrategy::Smart,
            10,
            5,
        )
        .with_cache(Arc::clone(&cache));

        let classifier = TreatmentClassifier::default();
        let case = CaseRef::new("2 U.S. 2", "A v. B", "scotus").with_opinion_id("op-1");
        let initial = snippet_result(&classifier, &case, "410 U.S. 113 is questioned");
        orchestrator
            .finalize_batch(&target(), vec![(case, initial)])
            .await;

        let cached = cache.get(CacheNamespace::Text, "op-1").await;
        assert_eq!(cached.as_deref(), Some("410 u.s. 113 is overruled."));
    }

    #[tokio::test]
    async fn test_text_memo_collapses_repeat_fetches() {
        let mut resolver = InMemoryResolver::new();
        resolver.add_full_text("op-1", "410 u.s. 113 is overruled.");
        let resolver = Arc::new(resolver);
        let orchestrator = FetchOrchestrator::new(
            Arc::clone(&resolver),
            Arc::new(TreatmentClassifier::default()),
            FetchStrategy::Smart,
            10,
            5,
        );

        let classifier = TreatmentClassifier::default();
        for citation in ["2 U.S. 2", "3 U.S. 3"] {
            let case = CaseRef::new(citation, "A v. B", "scotus").with_opinion_id("op-1");
            let initial = snippet_result(&classifier, &case, "410 U.S. 113 is questioned");
            orchestrator
                .finalize_batch(&target(), vec![(case, initial)])
                .await;
        }

        assert_eq!(resolver.full_text_fetches(), 1);
    }
}
