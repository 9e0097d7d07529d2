//! Merge per-category fetch results into one deduplicated corpus.

use crate::models::{ArticleCorpus, DedupKey, NormalizedArticle, RawArticle};
use crate::nlp::TextNormalizer;
use itertools::Itertools;
use tracing::{debug, info, instrument};

/// Concatenate `frames` in order, drop duplicate stories and attach the
/// cleaned text fields.
///
/// Duplicates are decided by `url` when any row has one, otherwise by
/// `title`. The first occurrence wins. Rows missing the key count as sharing
/// one (absent) key, so at most one of them survives.
#[instrument(level = "info", skip_all, fields(frames = frames.len()))]
pub fn aggregate(frames: Vec<Vec<RawArticle>>, normalizer: &TextNormalizer) -> ArticleCorpus {
    let rows: Vec<RawArticle> = frames.into_iter().flatten().collect();
    let dedup_key = if rows.iter().any(|r| r.url.is_some()) {
        DedupKey::Url
    } else {
        DedupKey::Title
    };
    let total = rows.len();

    let articles: Vec<NormalizedArticle> = rows
        .into_iter()
        .unique_by(|r| match dedup_key {
            DedupKey::Url => r.url.clone(),
            DedupKey::Title => r.title.clone(),
        })
        .map(|raw| normalize_article(raw, normalizer))
        .collect();

    debug!(?dedup_key, dropped = total - articles.len(), "Deduplicated articles");
    info!(count = articles.len(), "Aggregated article corpus");
    ArticleCorpus {
        dedup_key,
        articles,
    }
}

fn normalize_article(raw: RawArticle, normalizer: &TextNormalizer) -> NormalizedArticle {
    let clean_title = normalizer.normalize(raw.title.as_deref());
    let clean_description = normalizer.normalize(raw.description.as_deref());
    let combined_text = format!("{clean_title} {clean_description}").trim().to_string();
    NormalizedArticle {
        raw,
        clean_title,
        clean_description,
        combined_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, title: Option<&str>, url: Option<&str>) -> RawArticle {
        RawArticle {
            source_name: Some("Wire".to_string()),
            title: title.map(str::to_string),
            description: Some("Officials announced sweeping reforms".to_string()),
            url: url.map(str::to_string),
            published_at: None,
            category: category.to_string(),
        }
    }

    #[test]
    fn test_empty_input() {
        let corpus = aggregate(vec![], &TextNormalizer::first_pass_only());
        assert!(corpus.is_empty());
        let corpus = aggregate(vec![vec![], vec![]], &TextNormalizer::first_pass_only());
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_same_url_keeps_first() {
        let corpus = aggregate(
            vec![vec![
                row("general", Some("First headline"), Some("https://a.com/1")),
                row("general", Some("Second headline"), Some("https://a.com/1")),
            ]],
            &TextNormalizer::first_pass_only(),
        );
        assert_eq!(corpus.dedup_key, DedupKey::Url);
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.articles[0].raw.title.as_deref(), Some("First headline"));
    }

    #[test]
    fn test_order_across_categories() {
        let corpus = aggregate(
            vec![
                vec![
                    row("business", Some("A1"), Some("https://a.com/1")),
                    row("business", Some("A2"), Some("https://a.com/2")),
                ],
                vec![
                    row("sports", Some("B1"), Some("https://b.com/1")),
                    row("sports", Some("dup"), Some("https://a.com/2")),
                    row("sports", Some("B2"), Some("https://b.com/2")),
                ],
            ],
            &TextNormalizer::first_pass_only(),
        );
        let titles: Vec<_> = corpus
            .articles
            .iter()
            .map(|a| a.raw.title.as_deref().unwrap())
            .collect();
        assert_eq!(titles, vec!["A1", "A2", "B1", "B2"]);
        assert_eq!(corpus.articles[1].raw.category, "business");
    }

    #[test]
    fn test_title_key_without_urls() {
        let corpus = aggregate(
            vec![vec![
                row("general", Some("Same"), None),
                row("health", Some("Same"), None),
                row("health", Some("Other"), None),
            ]],
            &TextNormalizer::first_pass_only(),
        );
        assert_eq!(corpus.dedup_key, DedupKey::Title);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.articles[0].raw.category, "general");
    }

    #[test]
    fn test_rows_without_url_share_a_key() {
        let corpus = aggregate(
            vec![vec![
                row("general", Some("One"), Some("https://a.com/1")),
                row("general", Some("Two"), None),
                row("general", Some("Three"), None),
            ]],
            &TextNormalizer::first_pass_only(),
        );
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_clean_fields_always_present() {
        let mut raw = row("general", None, Some("https://a.com/1"));
        raw.description = None;
        let with_text = row("general", Some("Markets rallied"), Some("https://a.com/2"));
        let corpus = aggregate(vec![vec![raw, with_text]], &TextNormalizer::first_pass_only());

        let empty = &corpus.articles[0];
        assert_eq!(empty.clean_title, "");
        assert_eq!(empty.clean_description, "");
        assert_eq!(empty.combined_text, "");

        let full = &corpus.articles[1];
        assert_eq!(full.clean_title, "market rallied");
        assert_eq!(
            full.combined_text,
            format!("{} {}", full.clean_title, full.clean_description)
        );
    }
}
