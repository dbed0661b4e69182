//! Similarity Scorer: TF-IDF cosine similarity between the document text and
//! the concatenated extracted entities.
//!
//! The vector space is fitted on exactly the two documents being compared, so
//! nothing is shared between calls. Weighting follows the common defaults:
//! lowercased `\b\w\w+\b` tokens, raw term counts, smoothed idf
//! `ln((1 + n) / (1 + df)) + 1`, L2-normalized rows.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::entities::labels::CategorizedEntities;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

fn term_counts(doc: &str) -> HashMap<String, f64> {
    let lowered = doc.to_lowercase();
    let mut counts = HashMap::new();
    for token in token_regex().find_iter(&lowered) {
        *counts.entry(token.as_str().to_string()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity of two documents in a TF-IDF space fitted on just those two.
/// Returns 0.0 when either document has no tokens.
pub fn tfidf_cosine(a: &str, b: &str) -> f64 {
    let counts_a = term_counts(a);
    let counts_b = term_counts(b);
    if counts_a.is_empty() || counts_b.is_empty() {
        return 0.0;
    }

    let n_docs = 2.0_f64;
    let idf = |term: &str| {
        let df = [&counts_a, &counts_b]
            .iter()
            .filter(|c| c.contains_key(term))
            .count() as f64;
        ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
    };

    let weigh = |counts: &HashMap<String, f64>| -> HashMap<String, f64> {
        let mut weights: HashMap<String, f64> = counts
            .iter()
            .map(|(term, tf)| (term.clone(), tf * idf(term)))
            .collect();
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            weights.values_mut().for_each(|w| *w /= norm);
        }
        weights
    };

    let va = weigh(&counts_a);
    let vb = weigh(&counts_b);

    let dot: f64 = va
        .iter()
        .filter_map(|(term, wa)| vb.get(term).map(|wb| wa * wb))
        .sum();

    dot.clamp(0.0, 1.0)
}

/// Scores how much of the document's vocabulary the extracted entities cover.
pub fn calculate_cosine_similarity(text: &str, entities: &CategorizedEntities) -> f64 {
    tfidf_cosine(text, &entities.combined_text())
}
