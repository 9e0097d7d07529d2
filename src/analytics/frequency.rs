//! Word and source frequency summaries.

use crate::models::{ArticleCorpus, SourceCount, WordCount};
use std::collections::HashMap;

/// Counts keys while remembering the order they were first seen in.
#[derive(Debug, Default)]
struct OrderedCounter {
    index: HashMap<String, usize>,
    counts: Vec<(String, usize)>,
}

impl OrderedCounter {
    fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.counts.len());
                self.counts.push((key.to_string(), 1));
            }
        }
    }

    /// The `n` most frequent keys; ties keep first-seen order.
    fn most_common(mut self, n: usize) -> Vec<(String, usize)> {
        // stable sort keeps insertion order among equal counts
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts.truncate(n);
        self.counts
    }
}

/// The `top_n` most frequent whitespace-separated tokens across `texts`.
///
/// Accepts `&str` or `Option<&str>` items; `None` counts as empty text.
pub fn top_words<'a, I>(texts: I, top_n: usize) -> Vec<WordCount>
where
    I: IntoIterator,
    I::Item: Into<Option<&'a str>>,
{
    let mut counter = OrderedCounter::default();
    for text in texts {
        for token in text.into().unwrap_or_default().split_whitespace() {
            counter.add(token);
        }
    }
    counter
        .most_common(top_n)
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect()
}

/// The `top_n` publishers contributing the most articles. Articles without a
/// source name are not counted.
pub fn top_sources(corpus: &ArticleCorpus, top_n: usize) -> Vec<SourceCount> {
    let mut counter = OrderedCounter::default();
    for name in corpus
        .articles
        .iter()
        .filter_map(|a| a.raw.source_name.as_deref())
    {
        counter.add(name);
    }
    counter
        .most_common(top_n)
        .into_iter()
        .map(|(source, count)| SourceCount { source, count })
        .collect()
}
