//! Citation resolution backends.
//!
//! The resolver is the external legal-data collaborator: it looks up
//! citations, pages through citing cases, and retrieves full opinion
//! text. Network transport, auth, and retry/backoff live behind this
//! trait, outside the core.

pub mod memory;

use async_trait::async_trait;

use crate::types::{CaseRef, CitingPage};

/// Trait for citation resolution backends.
///
/// Implementations must return citing cases in a stable order for a given
/// (citation, cursor) pair; the builder's determinism depends on it.
#[async_trait]
pub trait CitationResolver: Send + Sync {
    /// Error type for resolver operations.
    type Error: std::error::Error + Send + Sync;

    /// Resolve a citation to its case, if it exists.
    async fn lookup_citation(&self, citation: &str) -> Result<Option<CaseRef>, Self::Error>;

    /// Fetch one page of cases citing the given citation.
    async fn find_citing_cases(
        &self,
        citation: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<CitingPage, Self::Error>;

    /// Fetch the full opinion text, if available.
    async fn opinion_full_text(&self, opinion_id: &str) -> Result<Option<String>, Self::Error>;
}

pub use memory::InMemoryResolver;
