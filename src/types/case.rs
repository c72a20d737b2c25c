//! Case identity types for the citation network engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalize a citation string into its canonical identity form.
///
/// Identity rules: case-insensitive, interior whitespace collapsed to a
/// single space, leading/trailing whitespace stripped.
///
/// Two citation strings that normalize identically refer to the same case
/// node in a network.
pub fn normalize_citation(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Court hierarchy level, used to weight a citing case's influence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CourtLevel {
    /// Supreme / court of last resort.
    Supreme,
    /// Appellate / circuit court.
    Appellate,
    /// Trial / district court.
    Trial,
    /// Court could not be classified.
    Unknown,
}

impl CourtLevel {
    /// Classify a raw court identifier string.
    ///
    /// Heuristic keyword match on the lowercased identifier; identifiers
    /// that match nothing classify as `Unknown`.
    pub fn from_court_id(court: &str) -> Self {
        let normalized = court.to_lowercase();
        if normalized.is_empty() {
            return Self::Unknown;
        }
        if normalized.contains("scotus") || normalized.contains("supreme") {
            Self::Supreme
        } else if normalized.contains("cir")
            || normalized.contains("app")
            || normalized.starts_with("ca")
        {
            Self::Appellate
        } else if normalized.contains("dist") || normalized.contains("trial") {
            Self::Trial
        } else {
            Self::Unknown
        }
    }

    /// Influence multiplier for this court level.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Supreme => 2.0,
            Self::Appellate => 1.5,
            Self::Trial => 1.0,
            Self::Unknown => 0.75,
        }
    }
}

impl Default for CourtLevel {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for CourtLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supreme => write!(f, "supreme"),
            Self::Appellate => write!(f, "appellate"),
            Self::Trial => write!(f, "trial"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Reference to a single case.
///
/// Identity is the normalized citation; all other fields are metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRef {
    /// Normalized citation string (identity key).
    pub citation: String,
    /// Case name, e.g. "Roe v. Wade".
    pub case_name: String,
    /// Raw court identifier from the data source.
    pub court: String,
    /// Filing date, when known.
    pub date_filed: Option<NaiveDate>,
    /// Opinion identifier for full-text retrieval, when known.
    pub opinion_id: Option<String>,
}

impl CaseRef {
    /// Create a case ref, normalizing the citation.
    pub fn new(citation: &str, case_name: &str, court: &str) -> Self {
        Self {
            citation: normalize_citation(citation),
            case_name: case_name.to_string(),
            court: court.to_string(),
            date_filed: None,
            opinion_id: None,
        }
    }

    /// Set the filing date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date_filed = Some(date);
        self
    }

    /// Set the opinion identifier.
    pub fn with_opinion_id(mut self, opinion_id: &str) -> Self {
        self.opinion_id = Some(opinion_id.to_string());
        self
    }

    /// Court level derived from the raw court identifier.
    pub fn court_level(&self) -> CourtLevel {
        CourtLevel::from_court_id(&self.court)
    }

    /// Filing year, when the filing date is known.
    pub fn filing_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.date_filed.map(|d| d.year())
    }
}

/// A citing case as returned by the resolver, including its snippet text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitingCase {
    /// Case reference (citation already normalized).
    pub case: CaseRef,
    /// Short text snippet surrounding the citing passage.
    pub snippet: String,
}

impl CitingCase {
    /// Create a citing case.
    pub fn new(case: CaseRef, snippet: &str) -> Self {
        Self {
            case,
            snippet: snippet.to_string(),
        }
    }
}

/// One page of citing-case results from the resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitingPage {
    /// Citing cases in source order.
    pub cases: Vec<CitingCase>,
    /// Cursor for the next page, absent on the last page.
    pub next_cursor: Option<String>,
}
