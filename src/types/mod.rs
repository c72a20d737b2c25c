//! Core types for the citation network engine.

pub mod case;
pub mod classification;
pub mod network;
pub mod statistics;

pub use case::{normalize_citation, CaseRef, CitingCase, CitingPage, CourtLevel};
pub use classification::{ClassificationResult, Polarity, SignalMatch, TextPass, Treatment};
pub use network::{CitationNetwork, NetworkEdge, NetworkFilter, NetworkNode, NetworkWarning};
pub use statistics::{Community, InfluenceEntry, NetworkStatistics};
