//! The second, part-of-speech-aware normalization pass.
//!
//! A [`LinguisticPipeline`] receives the first pass's tokens and returns the
//! tokens it keeps, each replaced by its lemma. It may drop tokens but never
//! reorders them.

use super::LinguisticError;
use super::lemmatizer::lemmatize;
use super::stopwords::is_second_pass_stopword;

/// A token-level linguistic pass run after stopword removal.
pub trait LinguisticPipeline: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Lemmatize and filter `tokens`, preserving their order.
    fn process(&self, tokens: &[String]) -> Result<Vec<String>, LinguisticError>;
}

/// Built-in pass: guesses each token's part of speech from its inflection,
/// lemmatizes it, then keeps alphabetic lemmas longer than two characters
/// that are not second-pass stopwords.
#[derive(Debug, Clone, Copy, Default)]
pub struct MorphologyPipeline;

impl LinguisticPipeline for MorphologyPipeline {
    fn name(&self) -> &str {
        "morphology"
    }

    fn process(&self, tokens: &[String]) -> Result<Vec<String>, LinguisticError> {
        Ok(tokens
            .iter()
            .filter(|token| !is_second_pass_stopword(token))
            .map(|token| lemmatize(token))
            .filter(|lemma| {
                lemma.len() > 2
                    && lemma.chars().all(|c| c.is_ascii_alphabetic())
                    && !is_second_pass_stopword(lemma)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_lemmas_replace_tokens_in_order() {
        let out = MorphologyPipeline
            .process(&tokens("markets rallied investors cheered"))
            .unwrap();
        assert_eq!(out, vec!["market", "rally", "investor", "cheer"]);
    }

    #[test]
    fn test_drops_second_pass_stopwords() {
        let out = MorphologyPipeline.process(&tokens("officials said really")).unwrap();
        assert_eq!(out, vec!["official"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(MorphologyPipeline.process(&[]).unwrap().is_empty());
    }
}
