//! # citegraph
//!
//! Treatment classification and citation network analysis for case law.
//!
//! The engine answers one question:
//!
//! > Given a case citation, how have later cases treated it, and is it
//! > still good law?
//!
//! ## Core Contract
//!
//! 1. Classify how each citing case treats a target citation from the
//!    text available (snippet first, full opinion on escalation)
//! 2. Build a bounded, cycle-safe citation network around the root case
//! 3. Derive influence rankings, communities, and distribution metrics
//!    from the completed network
//!
//! ## Architecture
//!
//! ```text
//! Root Citation → CitationNetworkBuilder → CitationNetwork → analytics
//!                        ↓           ↘
//!               CitationResolver   FetchOrchestrator → TreatmentClassifier
//!                                                            ↓
//!                                                      SignalLexicon
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same root + same config + same resolver data → identical network
//! - Node iteration is canonical (depth, then normalized citation)
//! - Edge ordering is canonical (from, to); duplicates are collapsed
//! - Fetch concurrency never affects classification outcomes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analytics;
pub mod builder;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lexicon;
pub mod resolver;
pub mod summary;
pub mod types;

// Re-exports
pub use analytics::{analyze, AnalyticsOptions};
pub use builder::{CancellationFlag, CitationNetworkBuilder};
pub use cache::{AnalysisCache, CacheNamespace, InMemoryCache};
pub use classifier::TreatmentClassifier;
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use fetch::{FetchOrchestrator, FetchStrategy};
pub use lexicon::{LexiconSignal, SignalLexicon};
pub use resolver::{CitationResolver, InMemoryResolver};
pub use summary::{summarize, TreatmentSummary};
pub use types::{
    normalize_citation, CaseRef, CitationNetwork, CitingCase, CitingPage, ClassificationResult,
    Community, CourtLevel, InfluenceEntry, NetworkEdge, NetworkFilter, NetworkNode,
    NetworkStatistics, NetworkWarning, Polarity, SignalMatch, TextPass, Treatment,
};
