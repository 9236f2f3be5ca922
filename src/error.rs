use thiserror::Error;

/// Caller-visible pipeline failures.
///
/// Embedding failures are deliberately absent: the projector absorbs them
/// and degrades to the fallback layout, so the analysis never aborts just
/// because visualization failed.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Fewer than 3 non-empty review texts were available. Raised before
    /// any numeric work begins.
    #[error("topic analysis requires at least 3 non-empty reviews, found {found}")]
    InsufficientData { found: usize },

    /// The filtered vocabulary was empty or the document-term matrix could
    /// not be formed.
    #[error("vectorization failed: {0}")]
    Vectorization(String),
}
