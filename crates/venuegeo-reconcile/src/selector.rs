//! Candidate selection over a provider's ranked result list.
//!
//! Selection trusts the provider's ordering completely: the first candidate
//! whose relevance clears the threshold wins. Nothing is re-ranked by
//! geometry, place type, or distance from previously stored coordinates,
//! because the address text is the source of truth.

use venuegeo_geocoder::GeocodeCandidate;

/// Result of running the selector over one provider response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection<'a> {
    /// The provider returned no candidates at all.
    Empty,
    /// Candidates exist but none reached the threshold.
    BelowThreshold { best_relevance: f64 },
    /// The first candidate, in provider order, at or above the threshold.
    Chosen(&'a GeocodeCandidate),
}

/// Returns the first candidate with `relevance >= min_relevance`, if any.
#[must_use]
pub fn select(candidates: &[GeocodeCandidate], min_relevance: f64) -> Option<&GeocodeCandidate> {
    candidates.iter().find(|c| c.relevance >= min_relevance)
}

/// Like [`select`], but tells "nothing found" apart from "nothing good enough".
#[must_use]
pub fn classify(candidates: &[GeocodeCandidate], min_relevance: f64) -> Selection<'_> {
    if candidates.is_empty() {
        return Selection::Empty;
    }
    match select(candidates, min_relevance) {
        Some(candidate) => Selection::Chosen(candidate),
        None => Selection::BelowThreshold {
            best_relevance: candidates
                .iter()
                .map(|c| c.relevance)
                .fold(f64::NEG_INFINITY, f64::max),
        },
    }
}
