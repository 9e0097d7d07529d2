//! Analytics over the aggregated corpus.
//!
//! - [`aggregate`]: merge and deduplicate per-category fetches
//! - [`frequency`]: top words and top sources
//! - [`sentiment`]: headline polarity
//! - [`entities`]: named entity recognition
//!
//! Models are loaded lazily by [`AnalyticsService`], at most once per
//! service, and shared by every refresh that uses the service.

pub mod aggregate;
pub mod entities;
pub mod frequency;
pub mod sentiment;

use crate::config::AnalyticsSettings;
use entities::{EntityExtractor, GazetteerTagger, TokenClassifier};
use once_cell::sync::OnceCell;
use sentiment::{LexiconModel, SentimentClassifier, SentimentModel};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to load {model} model: {reason}")]
    Load { model: &'static str, reason: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid lexicon {path}: {source}")]
    Lexicon {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("inference failed: {0}")]
    Inference(String),
}

type SentimentLoader = Box<dyn Fn() -> Result<Arc<dyn SentimentModel>, ModelError> + Send + Sync>;
type TaggerLoader = Box<dyn Fn() -> Result<Arc<dyn TokenClassifier>, ModelError> + Send + Sync>;

/// Owns the analytics models and hands out classifiers that borrow them.
///
/// A model that fails to load is remembered as missing; the service does not
/// retry, and the stages that need it fall back to their degraded output.
pub struct AnalyticsService {
    sentiment_loader: SentimentLoader,
    tagger_loader: TaggerLoader,
    sentiment: OnceCell<Option<Arc<dyn SentimentModel>>>,
    tagger: OnceCell<Option<Arc<dyn TokenClassifier>>>,
}

impl fmt::Debug for AnalyticsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaded = |name: Option<&str>| name.unwrap_or("<not loaded>").to_string();
        f.debug_struct("AnalyticsService")
            .field(
                "sentiment",
                &loaded(self.sentiment.get().and_then(|m| m.as_ref().map(|m| m.name()))),
            )
            .field(
                "tagger",
                &loaded(self.tagger.get().and_then(|m| m.as_ref().map(|m| m.name()))),
            )
            .finish()
    }
}

impl AnalyticsService {
    /// A service that calls the given loaders the first time each model is needed.
    pub fn new<S, T>(sentiment_loader: S, tagger_loader: T) -> Self
    where
        S: Fn() -> Result<Arc<dyn SentimentModel>, ModelError> + Send + Sync + 'static,
        T: Fn() -> Result<Arc<dyn TokenClassifier>, ModelError> + Send + Sync + 'static,
    {
        Self {
            sentiment_loader: Box::new(sentiment_loader),
            tagger_loader: Box::new(tagger_loader),
            sentiment: OnceCell::new(),
            tagger: OnceCell::new(),
        }
    }

    /// The built-in lexicon and gazetteer models, configured from `settings`.
    pub fn from_settings(settings: &AnalyticsSettings) -> Self {
        let lexicon_path = settings.lexicon_path.clone();
        Self::new(
            move || {
                let model = match &lexicon_path {
                    Some(path) => LexiconModel::with_overrides_from_file(path)?,
                    None => LexiconModel::builtin(),
                };
                Ok(Arc::new(model) as Arc<dyn SentimentModel>)
            },
            || Ok(Arc::new(GazetteerTagger) as Arc<dyn TokenClassifier>),
        )
    }

    /// A service with models already in hand. `None` means "unavailable".
    pub fn with_models(
        sentiment: Option<Arc<dyn SentimentModel>>,
        tagger: Option<Arc<dyn TokenClassifier>>,
    ) -> Self {
        Self {
            sentiment_loader: Box::new(|| -> Result<Arc<dyn SentimentModel>, ModelError> {
                Err(unloadable("sentiment"))
            }),
            tagger_loader: Box::new(|| -> Result<Arc<dyn TokenClassifier>, ModelError> {
                Err(unloadable("token-classification"))
            }),
            sentiment: OnceCell::with_value(sentiment),
            tagger: OnceCell::with_value(tagger),
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn sentiment_model(&self) -> Option<&dyn SentimentModel> {
        self.sentiment
            .get_or_init(|| match (self.sentiment_loader)() {
                Ok(model) => {
                    info!(model = model.name(), "Loaded sentiment model");
                    Some(model)
                }
                Err(e) => {
                    warn!(error = %e, "Sentiment model unavailable; titles will be NEUTRAL");
                    None
                }
            })
            .as_deref()
    }

    #[instrument(level = "debug", skip_all)]
    pub fn token_classifier(&self) -> Option<&dyn TokenClassifier> {
        self.tagger
            .get_or_init(|| match (self.tagger_loader)() {
                Ok(model) => {
                    info!(model = model.name(), "Loaded token classifier");
                    Some(model)
                }
                Err(e) => {
                    warn!(error = %e, "Token classifier unavailable; no entities will be extracted");
                    None
                }
            })
            .as_deref()
    }

    pub fn sentiment_classifier(&self) -> SentimentClassifier<'_> {
        SentimentClassifier::new(self.sentiment_model())
    }

    pub fn entity_extractor(&self) -> EntityExtractor<'_> {
        EntityExtractor::new(self.token_classifier())
    }
}

fn unloadable(model: &'static str) -> ModelError {
    ModelError::Load {
        model,
        reason: "no loader configured".to_string(),
    }
}
