//! Error taxonomy for the citation network engine.
//!
//! Only two conditions are fatal: an unresolvable root citation and an
//! invalid configuration. Everything else is a soft condition recorded as
//! a [`crate::types::NetworkWarning`] on the network.

/// Fatal errors aborting an analysis run before or at the root.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Root citation could not be resolved; aborts before any graph
    /// allocation.
    #[error("citation not found: {0}")]
    NotFound(String),

    /// Configuration rejected before building starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The resolver failed while resolving the root citation.
    #[error("resolver error: {0}")]
    Resolver(String),
}

impl AnalysisError {
    /// Wrap a resolver error.
    pub fn from_resolver<E: std::error::Error>(e: E) -> Self {
        Self::Resolver(e.to_string())
    }
}
