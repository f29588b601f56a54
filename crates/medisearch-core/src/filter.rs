//! Post-ranking evidence filters.
//!
//! Each filter is a pure subtractive pass that preserves relative order.
//! Filters are conjunctive and applied in a fixed order: origin, year, MeSH.

use tracing::info;

use crate::types::{Evidence, SearchFilters, SourceType, YearRange};

/// Apply the optional filter bundle to an already-ranked evidence list.
pub fn apply_filters(evidence: Vec<Evidence>, filters: Option<&SearchFilters>) -> Vec<Evidence> {
    let Some(filters) = filters else {
        return evidence;
    };

    let before = evidence.len();
    let mut filtered = evidence;

    if !keeps_all_origins(&filters.source_types) {
        filtered.retain(|e| {
            filters
                .source_types
                .iter()
                .any(|source| source.as_str() == e.origin)
        });
    }

    if let Some(range) = &filters.year_range {
        filtered.retain(|e| within_years(e, range));
    }

    if !filters.mesh_terms.is_empty() {
        let wanted: Vec<String> = filters.mesh_terms.iter().map(|t| t.to_lowercase()).collect();
        filtered.retain(|e| matches_mesh(e, &wanted));
    }

    info!(before, after = filtered.len(), "Evidence filters applied");
    filtered
}

fn keeps_all_origins(source_types: &[SourceType]) -> bool {
    source_types.is_empty() || source_types.contains(&SourceType::All)
}

fn within_years(evidence: &Evidence, range: &YearRange) -> bool {
    evidence
        .publication_year()
        .map_or(false, |year| range.contains(year))
}

fn matches_mesh(evidence: &Evidence, wanted: &[String]) -> bool {
    match evidence.mesh_terms_lowercase() {
        Some(serialized) => wanted.iter().any(|term| serialized.contains(term.as_str())),
        None => false,
    }
}
