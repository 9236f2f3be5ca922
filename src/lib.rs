//! Latent topic discovery and 2D map layout for free-text review
//! collections.
//!
//! Turns an ordered sequence of reviews into a small set of topics (top
//! terms with weights) and a 2D point per review, placed near reviews that
//! share its dominant topic. The pipeline is stateless, synchronous, and
//! deterministic under a fixed seed; if the nonlinear embedding fails, it
//! degrades to a deterministic index-based layout instead of aborting.

pub mod algo;
pub mod error;
pub mod ops;

pub use error::AnalysisError;
pub use ops::{
    analyze_records, analyze_texts, op_analyze, AnalysisResult, AnalyzeOptions, ProjectionPoint,
    Topic, DEFAULT_TEXT_FIELD,
};
