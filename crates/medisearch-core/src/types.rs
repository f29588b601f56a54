//! Core types for medical literature retrieval.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CoreError;

/// Free-form document metadata as stored alongside each corpus chunk.
pub type Metadata = serde_json::Map<String, Value>;

/// Separator between a paper identifier and its chunk index.
const CHUNK_SEPARATOR: &str = "_chunk_";

pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_QUERY_CHARS: usize = 500;
pub const MAX_TOP_K: usize = 50;
pub const DEFAULT_TOP_K: usize = 10;

lazy_static! {
    /// Four-digit publication year between 1900 and 2099.
    static ref YEAR_PATTERN: Regex = Regex::new(r"\b(19|20)\d{2}\b").unwrap();
}

/// One document of the corpus snapshot the indexes are built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusDocument {
    /// Chunk-qualified identifier (e.g., "pmid_123_chunk_0")
    pub id: String,

    /// Full chunk text
    pub text: String,

    /// Title, source, publication date, MeSH terms, ...
    #[serde(default)]
    pub metadata: Metadata,
}

/// A hit reported by the semantic (vector) index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticHit {
    pub id: String,

    /// Distance reported by the index (smaller is closer)
    pub distance: f64,

    #[serde(default)]
    pub metadata: Metadata,

    pub document: String,
}

/// A ranked, citable piece of evidence.
///
/// Produced by the [`HybridCombiner`](crate::HybridCombiner) and never mutated
/// afterwards; filters only remove items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    /// Chunk-qualified document identifier
    pub id: String,

    /// Paper identifier with the chunk suffix removed
    pub paper_id: String,

    pub title: String,

    /// Fused relevance in `[0, 1]`
    pub relevance_score: f64,

    /// Bounded excerpt of the chunk text
    pub excerpt: String,

    /// Origin tag (pubmed, medline, clinical_trial, ...)
    pub origin: String,

    #[serde(default)]
    pub metadata: Metadata,
}

impl Evidence {
    /// Publication year parsed from `metadata.publication_date`.
    pub fn publication_year(&self) -> Option<u16> {
        let raw = match self.metadata.get("publication_date")? {
            Value::String(s) => s.clone(),
            Value::Null => return None,
            other => other.to_string(),
        };
        YEAR_PATTERN
            .find(&raw)
            .and_then(|m| m.as_str().parse::<u16>().ok())
    }

    /// MeSH terms serialized and lowercased, if the document carries any.
    pub fn mesh_terms_lowercase(&self) -> Option<String> {
        let terms = self.metadata.get("mesh_terms")?;
        let serialized = match terms {
            Value::Null => return None,
            Value::String(s) if s.trim().is_empty() => return None,
            Value::Array(items) if items.is_empty() => return None,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some(serialized.to_lowercase())
    }
}

/// Strip the `_chunk_<n>` suffix from a document identifier.
pub fn paper_id_of(doc_id: &str) -> &str {
    match doc_id.find(CHUNK_SEPARATOR) {
        Some(pos) => &doc_id[..pos],
        None => doc_id,
    }
}

/// Title fallback: "pmid_123" -> "Pmid 123".
pub fn title_from_paper_id(paper_id: &str) -> String {
    paper_id
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Literature source a document originates from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Pubmed,
    Medline,
    ClinicalTrial,
    /// Keep-all sentinel
    All,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Pubmed => "pubmed",
            SourceType::Medline => "medline",
            SourceType::ClinicalTrial => "clinical_trial",
            SourceType::All => "all",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pubmed" => Ok(SourceType::Pubmed),
            "medline" => Ok(SourceType::Medline),
            "clinical_trial" | "clinical-trial" => Ok(SourceType::ClinicalTrial),
            "all" => Ok(SourceType::All),
            other => Err(CoreError::InvalidFilter(format!(
                "unknown source type '{}'",
                other
            ))),
        }
    }
}

/// Inclusive publication-year bounds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearRange {
    #[serde(default)]
    pub start: Option<u16>,

    #[serde(default)]
    pub end: Option<u16>,
}

impl YearRange {
    /// Build from `YYYY` or `YYYY-MM-DD` bounds; only the year is kept.
    pub fn from_dates(start: Option<&str>, end: Option<&str>) -> Result<Self, CoreError> {
        Ok(Self {
            start: start.map(parse_year_bound).transpose()?,
            end: end.map(parse_year_bound).transpose()?,
        })
    }

    /// Whether `year` lies within the bounds that are set.
    pub fn contains(&self, year: u16) -> bool {
        self.start.map_or(true, |start| year >= start) && self.end.map_or(true, |end| year <= end)
    }
}

fn parse_year_bound(raw: &str) -> Result<u16, CoreError> {
    let trimmed = raw.trim();
    trimmed
        .get(..4)
        .filter(|prefix| prefix.chars().all(|c| c.is_ascii_digit()))
        .and_then(|prefix| prefix.parse::<u16>().ok())
        .ok_or_else(|| {
            CoreError::InvalidFilter(format!(
                "date bound '{}' must start with a four-digit year",
                raw
            ))
        })
}

/// Optional post-ranking predicates. An absent bundle is the identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchFilters {
    /// Allowed origins; empty or containing `All` keeps everything
    #[serde(default)]
    pub source_types: Vec<SourceType>,

    #[serde(default)]
    pub year_range: Option<YearRange>,

    /// MeSH terms; a document is kept if any of them matches
    #[serde(default)]
    pub mesh_terms: Vec<String>,
}

/// A free-text medical query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    pub query: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub filters: Option<SearchFilters>,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl SearchRequest {
    /// Create a request with the default `top_k` and no filters.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            filters: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Validate query length and `top_k` bounds.
    pub fn validate(&self) -> Result<(), CoreError> {
        let chars = self.query.trim().chars().count();
        if !(MIN_QUERY_CHARS..=MAX_QUERY_CHARS).contains(&chars) {
            return Err(CoreError::InvalidRequest(format!(
                "query must be {}-{} characters, got {}",
                MIN_QUERY_CHARS, MAX_QUERY_CHARS, chars
            )));
        }

        if !(1..=MAX_TOP_K).contains(&self.top_k) {
            return Err(CoreError::InvalidRequest(format!(
                "top_k must be between 1 and {}, got {}",
                MAX_TOP_K, self.top_k
            )));
        }

        if let Some(range) = self.filters.as_ref().and_then(|f| f.year_range) {
            if let (Some(start), Some(end)) = (range.start, range.end) {
                if start > end {
                    return Err(CoreError::InvalidFilter(format!(
                        "year range start {} is after end {}",
                        start, end
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn evidence_with(metadata: Value) -> Evidence {
        Evidence {
            id: "p1_chunk_0".to_string(),
            paper_id: "p1".to_string(),
            title: "T".to_string(),
            relevance_score: 0.5,
            excerpt: String::new(),
            origin: "pubmed".to_string(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_paper_id_strips_chunk_suffix() {
        assert_eq!(paper_id_of("pmid_123_chunk_4"), "pmid_123");
        assert_eq!(paper_id_of("pmid_123"), "pmid_123");
    }

    #[test]
    fn test_title_fallback() {
        assert_eq!(title_from_paper_id("statin_trial_review"), "Statin Trial Review");
    }

    #[test]
    fn test_publication_year_extraction() {
        let e = evidence_with(json!({"publication_date": "Published 2019 Mar"}));
        assert_eq!(e.publication_year(), Some(2019));

        let e = evidence_with(json!({"publication_date": 2021}));
        assert_eq!(e.publication_year(), Some(2021));

        let e = evidence_with(json!({"publication_date": "n.d."}));
        assert_eq!(e.publication_year(), None);

        let e = evidence_with(json!({}));
        assert_eq!(e.publication_year(), None);
    }

    #[test]
    fn test_mesh_terms_serialization() {
        let e = evidence_with(json!({"mesh_terms": ["Diabetes Mellitus", "Insulin"]}));
        assert!(e.mesh_terms_lowercase().unwrap().contains("diabetes mellitus"));

        let e = evidence_with(json!({"mesh_terms": []}));
        assert!(e.mesh_terms_lowercase().is_none());
    }

    #[test]
    fn test_year_range_from_dates() {
        let range = YearRange::from_dates(Some("2018-01-01"), Some("2020")).unwrap();
        assert_eq!(range.start, Some(2018));
        assert_eq!(range.end, Some(2020));
        assert!(range.contains(2018));
        assert!(range.contains(2020));
        assert!(!range.contains(2021));

        assert!(YearRange::from_dates(Some("soon"), None).is_err());
    }

    #[test]
    fn test_source_type_parse() {
        assert_eq!("clinical_trial".parse::<SourceType>().unwrap(), SourceType::ClinicalTrial);
        assert_eq!("PubMed".parse::<SourceType>().unwrap(), SourceType::Pubmed);
        assert!("arxiv".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_request_validation() {
        assert!(SearchRequest::new("statins in elderly").validate().is_ok());
        assert!(SearchRequest::new("ab").validate().is_err());
        assert!(SearchRequest::new("x".repeat(501)).validate().is_err());
        assert!(SearchRequest::new("statins").with_top_k(0).validate().is_err());
        assert!(SearchRequest::new("statins").with_top_k(51).validate().is_err());

        let filters = SearchFilters {
            year_range: Some(YearRange { start: Some(2022), end: Some(2010) }),
            ..Default::default()
        };
        assert!(SearchRequest::new("statins").with_filters(filters).validate().is_err());
    }
}
