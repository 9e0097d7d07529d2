//! Text normalization for article titles and descriptions.
//!
//! # Submodules
//!
//! - [`normalizer`]: The [`TextNormalizer`] that turns raw text into cleaned tokens
//! - [`pipeline`]: The optional second linguistic pass behind [`LinguisticPipeline`]
//! - [`lemmatizer`]: Rule-based noun and verb lemmatization
//! - [`stopwords`]: First- and second-pass stopword sets
//! - [`markup`]: Plain-text extraction from HTML fragments in API payloads

pub mod lemmatizer;
pub mod markup;
pub mod normalizer;
pub mod pipeline;
pub mod stopwords;

pub use normalizer::TextNormalizer;
pub use pipeline::{LinguisticPipeline, MorphologyPipeline};

/// Errors raised by a linguistic pipeline.
///
/// These never leave the normalizer; it logs them and keeps its first-pass output.
#[derive(Debug, thiserror::Error)]
pub enum LinguisticError {
    #[error("linguistic resource unavailable: {0}")]
    Unavailable(String),
    #[error("linguistic pass failed: {0}")]
    Failed(String),
}
