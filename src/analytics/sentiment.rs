//! Headline sentiment.
//!
//! A [`SentimentModel`] is a binary classifier: every text gets POSITIVE or
//! NEGATIVE with a confidence. The [`SentimentClassifier`] maps its verdicts
//! into the report's three-way [`SentimentLabel`]; `Neutral` is only used
//! when the model gave no verdict at all.

use super::ModelError;
use crate::models::{SentimentCount, SentimentLabel};
use crate::nlp::lemmatizer::lemmatize;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use tracing::{debug, info, instrument, warn};

/// Model-side verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl From<Polarity> for SentimentLabel {
    fn from(p: Polarity) -> Self {
        match p {
            Polarity::Positive => SentimentLabel::Positive,
            Polarity::Negative => SentimentLabel::Negative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub polarity: Polarity,
    /// Confidence in `polarity`, in `0.5..=1.0`.
    pub score: f32,
}

/// A batch binary sentiment model.
pub trait SentimentModel: Send + Sync {
    fn name(&self) -> &str;

    /// Classify every text in one call. Must return one prediction per input.
    fn predict(&self, texts: &[&str]) -> Result<Vec<Prediction>, ModelError>;
}

/// Weighted news lexicon. Weights are keyed by lemma.
const BUILTIN_LEXICON: &[(&str, f32)] = &[
    // positive
    ("gain", 1.5), ("rise", 1.0), ("win", 2.0), ("growth", 1.5), ("boost", 1.5),
    ("surge", 1.5), ("rally", 2.0), ("soar", 2.0), ("jump", 1.0), ("climb", 1.0),
    ("record", 0.5), ("success", 2.0), ("successful", 2.0), ("recover", 1.5),
    ("recovery", 1.5), ("improve", 1.5), ("hope", 1.0), ("hopeful", 1.5), ("peace", 2.0),
    ("agree", 1.0), ("agreement", 1.0), ("breakthrough", 2.5), ("celebrate", 2.0),
    ("award", 1.5), ("best", 2.0), ("great", 2.0), ("good", 1.5), ("strong", 1.0),
    ("profit", 1.0), ("approve", 1.0), ("support", 0.5), ("launch", 0.5),
    ("innovative", 1.5), ("benefit", 1.5), ("help", 1.0), ("rescue", 1.5), ("save", 1.0),
    ("safe", 1.0), ("cure", 2.0), ("love", 2.0), ("happy", 2.0), ("optimism", 2.0),
    ("optimistic", 2.0), ("upgrade", 1.0), ("expand", 1.0), ("beat", 1.0), ("victory", 2.0),
    ("champion", 1.5), ("thrive", 2.0), ("welcome", 1.0), ("praise", 1.5), ("hero", 1.5),
    ("reunite", 1.5), ("milestone", 1.5), ("historic", 1.0), ("advance", 1.0),
    ("bullish", 2.0), ("upbeat", 2.0), ("ease", 0.5), ("relief", 1.5), ("secure", 0.5),
    // negative
    ("kill", -3.0), ("death", -3.0), ("dead", -3.0), ("die", -3.0), ("crash", -2.5),
    ("war", -2.5), ("attack", -2.5), ("fall", -1.0), ("drop", -1.0), ("plunge", -2.0),
    ("slump", -2.0), ("tumble", -2.0), ("loss", -1.5), ("lose", -1.5), ("fail", -2.0),
    ("failure", -2.0), ("crisis", -2.5), ("fear", -2.0), ("threat", -2.0),
    ("threaten", -2.0), ("warn", -1.5), ("warning", -1.5), ("fraud", -2.5),
    ("scandal", -2.5), ("lawsuit", -1.5), ("sue", -1.5), ("arrest", -2.0),
    ("charge", -1.0), ("bomb", -3.0), ("bombing", -3.0), ("shooting", -3.0),
    ("shoot", -2.5), ("flood", -2.0), ("storm", -1.5), ("earthquake", -2.5),
    ("disaster", -3.0), ("injury", -2.0), ("injure", -2.0), ("victim", -2.0),
    ("violence", -2.5), ("protest", -1.0), ("strike", -1.0), ("decline", -1.5),
    ("layoff", -2.0), ("recession", -2.5), ("inflation", -1.0), ("debt", -1.0),
    ("bankrupt", -3.0), ("bankruptcy", -3.0), ("collapse", -2.5), ("concern", -1.0),
    ("risk", -1.0), ("ban", -1.0), ("sanction", -1.5), ("conflict", -2.0),
    ("tension", -1.5), ("worst", -2.5), ("bad", -2.0), ("poor", -1.5), ("weak", -1.0),
    ("slow", -0.5), ("hack", -2.0), ("breach", -2.0), ("outage", -2.0), ("delay", -1.0),
    ("cancel", -1.0), ("accuse", -2.0), ("guilty", -2.0), ("crime", -2.0),
    ("murder", -3.0), ("abuse", -2.5), ("toxic", -2.0), ("sick", -1.5), ("disease", -1.5),
    ("outbreak", -2.5), ("pandemic", -2.0), ("virus", -1.5), ("struggle", -1.5),
    ("fire", -1.5), ("wildfire", -2.5), ("dispute", -1.0), ("cut", -1.0), ("slash", -1.5),
    ("bearish", -2.0), ("panic", -2.0), ("chaos", -2.0), ("deadly", -3.0), ("fatal", -3.0),
    ("terror", -3.0), ("hostage", -2.5), ("invasion", -2.5), ("casualty", -2.5),
];

static BUILTIN: Lazy<HashMap<String, f32>> = Lazy::new(|| {
    BUILTIN_LEXICON
        .iter()
        .map(|(word, weight)| (word.to_string(), *weight))
        .collect()
});

const NEGATORS: &[&str] = &[
    "not", "no", "never", "nobody", "nothing", "neither", "nor", "without", "hardly", "lack",
];

/// How many following tokens a negator flips.
const NEGATION_SCOPE: usize = 2;

/// Lexicon-based [`SentimentModel`].
///
/// Scores are the sum of token weights, with weights flipped inside a short
/// window after a negator. A sum of zero (no evidence, including empty text)
/// is POSITIVE, which is what binary classifiers report for empty input.
#[derive(Debug, Clone)]
pub struct LexiconModel {
    weights: HashMap<String, f32>,
}

impl LexiconModel {
    /// The built-in news lexicon.
    pub fn builtin() -> Self {
        Self {
            weights: BUILTIN.clone(),
        }
    }

    /// The built-in lexicon with entries from a YAML `word: weight` map on top.
    #[instrument(level = "info")]
    pub fn with_overrides_from_file(path: &str) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_string(),
            source,
        })?;
        let overrides: HashMap<String, f32> =
            serde_yaml::from_str(&raw).map_err(|source| ModelError::Lexicon {
                path: path.to_string(),
                source,
            })?;
        let mut model = Self::builtin();
        info!(entries = overrides.len(), "Merging user lexicon");
        model.weights.extend(
            overrides
                .into_iter()
                .map(|(word, weight)| (word.to_lowercase(), weight)),
        );
        Ok(model)
    }

    fn weight(&self, token: &str) -> Option<f32> {
        self.weights
            .get(token)
            .or_else(|| self.weights.get(&lemmatize(token)))
            .copied()
    }

    fn score(&self, text: &str) -> f32 {
        let lowered = text.to_lowercase();
        let mut total = 0.0;
        let mut negated_for = 0usize;
        for token in lowered
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|t| !t.is_empty())
        {
            if NEGATORS.contains(&token) {
                negated_for = NEGATION_SCOPE;
                continue;
            }
            if let Some(w) = self.weight(token) {
                total += if negated_for > 0 { -w } else { w };
            }
            negated_for = negated_for.saturating_sub(1);
        }
        total
    }
}

impl SentimentModel for LexiconModel {
    fn name(&self) -> &str {
        "news-lexicon"
    }

    fn predict(&self, texts: &[&str]) -> Result<Vec<Prediction>, ModelError> {
        Ok(texts
            .iter()
            .map(|text| {
                let total = self.score(text);
                let polarity = if total < 0.0 {
                    Polarity::Negative
                } else {
                    Polarity::Positive
                };
                Prediction {
                    polarity,
                    score: 0.5 + 0.5 * (total.abs() / 2.0).tanh(),
                }
            })
            .collect())
    }
}

/// Classifies cleaned titles with whatever model the service loaded.
pub struct SentimentClassifier<'a> {
    model: Option<&'a dyn SentimentModel>,
}

impl<'a> SentimentClassifier<'a> {
    pub fn new(model: Option<&'a dyn SentimentModel>) -> Self {
        Self { model }
    }

    /// One label per title, same order. The model is called once for the batch.
    #[instrument(level = "info", skip_all, fields(count = titles.len()))]
    pub fn classify<S: AsRef<str>>(&self, titles: &[S]) -> Vec<SentimentLabel> {
        if titles.is_empty() {
            return Vec::new();
        }
        let Some(model) = self.model else {
            warn!("No sentiment model loaded; labelling all titles NEUTRAL");
            return vec![SentimentLabel::Neutral; titles.len()];
        };

        let texts: Vec<&str> = titles.iter().map(AsRef::as_ref).collect();
        match model.predict(&texts) {
            Ok(predictions) if predictions.len() == texts.len() => {
                debug!(model = model.name(), "Sentiment batch classified");
                predictions
                    .into_iter()
                    .map(|p| SentimentLabel::from(p.polarity))
                    .collect()
            }
            Ok(predictions) => {
                warn!(
                    model = model.name(),
                    expected = texts.len(),
                    got = predictions.len(),
                    "Sentiment model returned the wrong number of predictions"
                );
                vec![SentimentLabel::Neutral; titles.len()]
            }
            Err(e) => {
                warn!(model = model.name(), error = %e, "Sentiment inference failed");
                vec![SentimentLabel::Neutral; titles.len()]
            }
        }
    }
}

/// Count labels in POSITIVE, NEGATIVE, NEUTRAL order, omitting zero counts.
pub fn sentiment_distribution<'a>(
    labels: impl IntoIterator<Item = &'a SentimentLabel>,
) -> Vec<SentimentCount> {
    let mut counts: HashMap<SentimentLabel, usize> = HashMap::new();
    for label in labels {
        *counts.entry(*label).or_default() += 1;
    }
    SentimentLabel::ALL
        .iter()
        .filter_map(|label| {
            counts.get(label).map(|&count| SentimentCount {
                sentiment: *label,
                count,
            })
        })
        .collect()
}
