//! In-memory resolver for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::types::{normalize_citation, CaseRef, CitingCase, CitingPage};
use super::CitationResolver;

/// Error type for the in-memory resolver.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Injected failure for resilience tests.
    #[error("injected failure for {0}")]
    Injected(String),
}

/// In-memory resolver for testing.
///
/// Uses BTreeMap for deterministic iteration order. Counts full-text
/// fetches so tests can assert on escalation behavior, and supports
/// injected failures per citation.
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    cases: BTreeMap<String, CaseRef>,
    citing: BTreeMap<String, Vec<CitingCase>>,
    full_texts: BTreeMap<String, String>,
    failing: Vec<String>,
    fetch_count: AtomicUsize,
}

impl InMemoryResolver {
    /// Create a new empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a case.
    pub fn add_case(&mut self, case: CaseRef) {
        self.cases.insert(case.citation.clone(), case);
    }

    /// Register a citing relationship: `citing` cites `cited`.
    ///
    /// Also registers the citing case for lookup.
    pub fn add_citing(&mut self, cited: &str, citing: CitingCase) {
        self.add_case(citing.case.clone());
        self.citing
            .entry(normalize_citation(cited))
            .or_default()
            .push(citing);
    }

    /// Register full opinion text for an opinion id.
    pub fn add_full_text(&mut self, opinion_id: &str, text: &str) {
        self.full_texts
            .insert(opinion_id.to_string(), text.to_string());
    }

    /// Make `find_citing_cases` fail for the given citation.
    pub fn fail_citing_for(&mut self, citation: &str) {
        self.failing.push(normalize_citation(citation));
    }

    /// Number of full-text fetches issued so far.
    pub fn full_text_fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CitationResolver for InMemoryResolver {
    type Error = InMemoryError;

    async fn lookup_citation(&self, citation: &str) -> Result<Option<CaseRef>, Self::Error> {
        Ok(self.cases.get(&normalize_citation(citation)).cloned())
    }

    async fn find_citing_cases(
        &self,
        citation: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<CitingPage, Self::Error> {
        let key = normalize_citation(citation);
        if self.failing.contains(&key) {
            return Err(InMemoryError::Injected(key));
        }

        let all = self.citing.get(&key).cloned().unwrap_or_default();
        let offset: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let page: Vec<CitingCase> = all.iter().skip(offset).take(limit).cloned().collect();
        let next = offset + page.len();
        let next_cursor = if next < all.len() {
            Some(next.to_string())
        } else {
            None
        };

        Ok(CitingPage {
            cases: page,
            next_cursor,
        })
    }

    async fn opinion_full_text(&self, opinion_id: &str) -> Result<Option<String>, Self::Error> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.full_texts.get(opinion_id).cloned())
    }
}
