//! Raw article text to cleaned token string.
//!
//! # Steps
//!
//! 1. Lowercase and fold accented letters to their base letter
//! 2. Strip `http(s)://` URLs
//! 3. Replace every character that is not `a-z` or whitespace with a space
//! 4. Split on whitespace, drop stopwords and tokens of two characters or fewer
//! 5. Lemmatize each survivor as a noun and drop lemmas that became stopwords
//! 6. Optionally hand the tokens to a [`LinguisticPipeline`]
//!
//! The output is the surviving tokens joined by single spaces. A second pass
//! that fails leaves the first pass's output in place.

use super::LinguisticPipeline;
use super::lemmatizer::noun_lemma;
use super::stopwords::is_stopword;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::warn;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static NON_ALPHA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z\s]").unwrap());

/// Turns article text into a space-joined string of lemmas.
///
/// Cheap to clone; the second pass is shared.
#[derive(Clone, Default)]
pub struct TextNormalizer {
    second_pass: Option<Arc<dyn LinguisticPipeline>>,
}

impl fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("second_pass", &self.second_pass.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl TextNormalizer {
    /// A normalizer that only runs the first pass.
    pub fn first_pass_only() -> Self {
        Self { second_pass: None }
    }

    /// A normalizer that runs `pipeline` after the first pass.
    pub fn with_second_pass(pipeline: Arc<dyn LinguisticPipeline>) -> Self {
        Self {
            second_pass: Some(pipeline),
        }
    }

    /// Normalize `text`. `None` and empty input yield an empty string.
    pub fn normalize<'a>(&self, text: impl Into<Option<&'a str>>) -> String {
        let Some(text) = text.into() else {
            return String::new();
        };
        if text.is_empty() {
            return String::new();
        }

        let tokens = first_pass(text);
        if tokens.is_empty() {
            return String::new();
        }

        let tokens = match &self.second_pass {
            Some(pipeline) => match pipeline.process(&tokens) {
                Ok(lemmas) => lemmas,
                Err(e) => {
                    warn!(pipeline = pipeline.name(), error = %e, "Second normalization pass failed; keeping first pass");
                    tokens
                }
            },
            None => tokens,
        };
        tokens.join(" ")
    }
}

fn first_pass(text: &str) -> Vec<String> {
    let folded: String = text
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    let without_urls = URL_RE.replace_all(&folded, "");
    let letters_only = NON_ALPHA_RE.replace_all(&without_urls, " ");

    letters_only
        .split_whitespace()
        .filter(|token| token.len() > 2 && !is_stopword(token))
        .map(noun_lemma)
        .filter(|lemma| lemma.len() > 2 && !is_stopword(lemma))
        .collect()
}
