//! Pipeline orchestration and the externally visible result shape.
//!
//! `analyze_texts` runs the full pipeline over plain strings;
//! `analyze_records` extracts a text field from JSON rows first.
//! `op_analyze` is a thin `serde_json::Value` wrapper for callers that
//! speak JSON end to end. All entry points are synchronous and stateless:
//! one call in, one result out, nothing cached across calls.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::algo::{lda, normalize, params, tsne, vectorize};
use crate::error::AnalysisError;

/// Text field consulted by the record-level entry point by default.
pub const DEFAULT_TEXT_FIELD: &str = "review_content";

const MIN_DOCUMENTS: usize = 3;
const LDA_MAX_ITER: usize = 20;
const SNIPPET_CHARS: usize = 100;

/// Tunable pipeline parameters.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Requested topic count. `None` derives it from the document count:
    /// `clamp(n_docs / 3, 2, 5)`. Either way the final count is capped at
    /// `min(n_docs - 1, vocabulary size)` and floored at 2.
    pub n_topics: Option<usize>,
    /// Terms reported per topic.
    pub n_top_words: usize,
    /// Vocabulary cap for the document-term matrix.
    pub max_features: usize,
    /// Seed threaded into both the topic model and the embedding.
    pub seed: u64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            n_topics: None,
            n_top_words: 10,
            max_features: 1000,
            seed: 42,
        }
    }
}

/// One discovered topic: its top terms and their weights, both in
/// descending weight order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: usize,
    pub words: Vec<String>,
    pub weights: Vec<f64>,
}

/// One review placed on the 2D map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub x: f64,
    pub y: f64,
    /// Dominant topic for this review, in `[0, topic_count)`.
    pub topic: usize,
    /// Index of the review in the input sequence.
    pub review_index: usize,
    /// First 100 characters of the original text, with `...` appended
    /// when truncated.
    pub snippet: String,
}

/// Complete analysis output. Immutable, serialization-ready, rebuilt from
/// scratch on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub topic_count: usize,
    pub topics: Vec<Topic>,
    pub points: Vec<ProjectionPoint>,
    pub document_count: usize,
}

/// Extract a text field from a JSON object, returning "" if missing.
pub fn get_text(row: &Value, field: &str) -> String {
    row.get(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Run the pipeline over JSON review records.
///
/// Rows whose `field` is missing or empty are dropped before the minimum
/// document check, so the insufficient-data message reports the number of
/// usable reviews actually found.
pub fn analyze_records(
    rows: &[Value],
    field: &str,
    opts: &AnalyzeOptions,
) -> Result<AnalysisResult, AnalysisError> {
    let texts: Vec<String> = rows
        .iter()
        .map(|row| get_text(row, field))
        .filter(|text| !text.is_empty())
        .collect();
    analyze_texts(&texts, opts)
}

/// Run the full pipeline over an ordered sequence of review texts.
///
/// Pipeline:
/// 1. Normalize each document (script letters + digits, collapsed spaces)
/// 2. Build the unigram/bigram document-term matrix with frequency bounds
/// 3. Fit the latent topic model with the resolved topic count
/// 4. Project document-topic rows to 2D, degrading to the `(i, 0)` layout
///    if the embedding fails internally
/// 5. Assemble topics, points, and counts into the result
pub fn analyze_texts(
    reviews: &[String],
    opts: &AnalyzeOptions,
) -> Result<AnalysisResult, AnalysisError> {
    let n_docs = reviews.len();
    if n_docs < MIN_DOCUMENTS {
        return Err(AnalysisError::InsufficientData { found: n_docs });
    }

    let normalized: Vec<String> = reviews
        .par_iter()
        .map(|text| normalize::normalize(text))
        .collect();

    let vectorize_cfg = vectorize::VectorizeConfig {
        max_features: opts.max_features,
        ..Default::default()
    };
    let matrix = vectorize::vectorize(&normalized, &vectorize_cfg)?;

    let requested = opts
        .n_topics
        .unwrap_or_else(|| params::effective_param(n_docs / 3, 2, &[5]));
    let topic_count = params::effective_param(requested, 2, &[n_docs - 1, matrix.n_terms()]);
    debug!(
        requested,
        topic_count,
        vocabulary = matrix.n_terms(),
        "resolved topic count"
    );

    let model = lda::fit(&matrix, topic_count, LDA_MAX_ITER, opts.seed);

    let topics: Vec<Topic> = (0..topic_count)
        .map(|id| {
            let top = model.top_terms(id, opts.n_top_words, &matrix.vocabulary);
            let (words, weights) = top.into_iter().unzip();
            Topic { id, words, weights }
        })
        .collect();

    let perplexity = params::effective_param(30, 2, &[n_docs - 1]) as f64;
    let tsne_cfg = tsne::TsneConfig {
        perplexity,
        seed: opts.seed,
        ..Default::default()
    };
    let layout = tsne::project(&model.doc_topic, &tsne_cfg);
    let dominant = model.dominant_topics();

    let points: Vec<ProjectionPoint> = layout
        .coords
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| ProjectionPoint {
            x,
            y,
            topic: dominant[i],
            review_index: i,
            snippet: snippet(&reviews[i]),
        })
        .collect();

    Ok(AnalysisResult {
        topic_count,
        topics,
        points,
        document_count: n_docs,
    })
}

/// JSON-rows wrapper around [`analyze_records`].
pub fn op_analyze(rows: &[Value], field: &str, opts: &AnalyzeOptions) -> Result<Value, String> {
    let result = analyze_records(rows, field, opts).map_err(|e| e.to_string())?;
    serde_json::to_value(&result).map_err(|e| e.to_string())
}

/// First `SNIPPET_CHARS` characters of the text, `...`-terminated when
/// truncated. Character-based so multibyte scripts never split mid-glyph.
fn snippet(text: &str) -> String {
    if text.chars().count() > SNIPPET_CHARS {
        let mut s: String = text.chars().take(SNIPPET_CHARS).collect();
        s.push_str("...");
        s
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_short_text_verbatim() {
        assert_eq!(snippet("short review"), "short review");
    }

    #[test]
    fn snippet_exact_length_verbatim() {
        let text: String = "a".repeat(100);
        assert_eq!(snippet(&text), text);
    }

    #[test]
    fn snippet_truncates_with_ellipsis() {
        let text: String = "b".repeat(150);
        let s = snippet(&text);
        assert_eq!(s.chars().count(), 103);
        assert!(s.ends_with("..."));
    }

    #[test]
    fn snippet_counts_chars_not_bytes() {
        let text: String = "배".repeat(120);
        let s = snippet(&text);
        assert_eq!(s.chars().count(), 103);
    }

    #[test]
    fn get_text_missing_field_is_empty() {
        let row = serde_json::json!({"other": "x"});
        assert_eq!(get_text(&row, DEFAULT_TEXT_FIELD), "");
    }
}
