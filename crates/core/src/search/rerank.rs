//! Lexical reranking of search results.
//!
//! Fuses exact substring hits over a record's text and metadata values with
//! a normalized Levenshtein similarity between the record text and the
//! query. The resulting `relevance` is transient and only orders the final
//! result page; cosine similarity has already chosen the candidates.

use crate::record::Vector;
use std::cmp::Ordering;

/// Scores and reorders `records` by relevance to `query`, descending.
///
/// An empty query is a no-op: every substring test would match vacuously
/// and the edit-distance term would only shuffle the cosine ordering, so
/// the incoming order is preserved. Ties keep their incoming order.
pub fn rerank(records: &mut [Vector], query: &str) {
    if query.is_empty() {
        return;
    }
    for record in records.iter_mut() {
        record.relevance = relevance_score(record, query);
    }
    records.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(Ordering::Equal));
}

/// Relevance of one record: +1.0 for a substring hit in the text, +0.5 per
/// metadata value containing the query, plus `1 - distance / max_len`
/// normalized Levenshtein similarity (0 when both strings are empty).
pub fn relevance_score(record: &Vector, query: &str) -> f64 {
    let mut score = 0.0;

    if record.text.contains(query) {
        score += 1.0;
    }
    for value in record.metadata.values() {
        if value.contains(query) {
            score += 0.5;
        }
    }

    let longest = record.text.chars().count().max(query.chars().count());
    if longest > 0 {
        let distance = strsim::levenshtein(&record.text, query);
        score += 1.0 - distance as f64 / longest as f64;
    }

    score
}
