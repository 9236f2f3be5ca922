use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::AnalysisError;

/// Document-frequency bounds and vocabulary cap for the term matrix.
#[derive(Debug, Clone)]
pub struct VectorizeConfig {
    /// Maximum retained vocabulary size.
    pub max_features: usize,
    /// A term must appear in at least this many documents.
    pub min_doc_freq: usize,
    /// A term must appear in at most this fraction of documents.
    pub max_doc_freq_ratio: f64,
}

impl Default for VectorizeConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            min_doc_freq: 2,
            max_doc_freq_ratio: 0.8,
        }
    }
}

/// Sparse document-term matrix over a fixed vocabulary of unigrams and
/// bigrams. Row count always equals the number of input documents.
#[derive(Debug, Clone)]
pub struct DocTermMatrix {
    /// Index → term. Fixed once built; shared read-only by later stages.
    pub vocabulary: Vec<String>,
    /// One sparse row per document: (term index, occurrence count),
    /// ascending by term index.
    pub rows: Vec<Vec<(usize, f64)>>,
}

impl DocTermMatrix {
    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }

    pub fn n_terms(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Lowercase word tokens plus adjacent-pair bigrams for one document.
fn terms(doc: &str) -> Vec<String> {
    let tokens: Vec<String> = doc.unicode_words().map(|w| w.to_lowercase()).collect();
    let mut out = tokens.clone();
    out.extend(tokens.windows(2).map(|pair| pair.join(" ")));
    out
}

/// Build the document-term matrix from normalized documents.
///
/// Terms are retained when their document frequency is at least
/// `min_doc_freq` and at most `max_doc_freq_ratio` of all documents.
/// The retained set is capped at `max_features` terms, keeping the highest
/// aggregate frequencies; ties break toward the term seen first in corpus
/// order.
pub fn vectorize(docs: &[String], config: &VectorizeConfig) -> Result<DocTermMatrix, AnalysisError> {
    let n_docs = docs.len();

    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut doc_freq: HashMap<String, usize> = HashMap::new();
    let mut total_freq: HashMap<String, usize> = HashMap::new();
    let mut doc_counts: Vec<HashMap<String, f64>> = Vec::with_capacity(n_docs);

    for doc in docs {
        let mut counts: HashMap<String, f64> = HashMap::new();
        for term in terms(doc) {
            let order = first_seen.len();
            first_seen.entry(term.clone()).or_insert(order);
            *total_freq.entry(term.clone()).or_insert(0) += 1;
            *counts.entry(term).or_insert(0.0) += 1.0;
        }
        for term in counts.keys() {
            *doc_freq.entry(term.clone()).or_insert(0) += 1;
        }
        doc_counts.push(counts);
    }

    let max_df = config.max_doc_freq_ratio * n_docs as f64;
    let mut retained: Vec<(String, usize, usize)> = doc_freq
        .iter()
        .filter(|(_, &df)| df >= config.min_doc_freq && df as f64 <= max_df)
        .map(|(term, _)| (term.clone(), total_freq[term], first_seen[term]))
        .collect();

    // Highest aggregate frequency first; ties go to the first-seen term.
    retained.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    retained.truncate(config.max_features);

    if retained.is_empty() {
        return Err(AnalysisError::Vectorization(
            "no vocabulary terms survived document-frequency filtering".into(),
        ));
    }

    let vocabulary: Vec<String> = retained.into_iter().map(|(term, _, _)| term).collect();
    let term_idx: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    let rows: Vec<Vec<(usize, f64)>> = doc_counts
        .into_iter()
        .map(|counts| {
            let mut row: Vec<(usize, f64)> = counts
                .into_iter()
                .filter_map(|(term, count)| term_idx.get(term.as_str()).map(|&i| (i, count)))
                .collect();
            row.sort_unstable_by_key(|&(i, _)| i);
            row
        })
        .collect();

    Ok(DocTermMatrix { vocabulary, rows })
}
