//! Named entity extraction.
//!
//! A [`TokenClassifier`] tags each token of a text with a BIO label
//! (`B-ORG`, `I-ORG`, `O`, ...) and its byte offsets. [`aggregate_simple`]
//! then merges consecutive tokens of one entity into a single span:
//!
//! - `B-X` always opens a new entity
//! - `I-X` extends the open entity when its label is `X`, otherwise it opens
//!   a new one
//! - `O` closes the open entity
//!
//! The surface form of an entity is the source text from its first token's
//! start to its last token's end, so connectors and punctuation inside a span
//! (`Bank of America`, `AT&T`) are kept.
//!
//! [`GazetteerTagger`] is the built-in classifier: capitalization runs,
//! honorifics and connectors decide spans, and gazetteers plus a few
//! suffix heuristics decide labels.

use super::ModelError;
use crate::models::{Entity, EntityLabel};
use crate::nlp::markup::strip_markup;
use crate::nlp::stopwords::is_stopword;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Token-level prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BioTag {
    Begin(EntityLabel),
    Inside(EntityLabel),
    Outside,
}

/// A tagged token; `start..end` is a byte range into the tagged text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTag {
    pub start: usize,
    pub end: usize,
    pub tag: BioTag,
}

/// A token classification model.
pub trait TokenClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Tag the tokens of `text`, left to right.
    fn tag(&self, text: &str) -> Result<Vec<TokenTag>, ModelError>;
}

/// Merge token predictions into entities ("simple" aggregation).
pub fn aggregate_simple(text: &str, tags: &[TokenTag]) -> Vec<Entity> {
    struct Open {
        label: EntityLabel,
        start: usize,
        end: usize,
    }

    fn close(text: &str, open: Option<Open>, out: &mut Vec<Entity>) {
        let Some(open) = open else { return };
        if let Some(surface) = text.get(open.start..open.end) {
            let surface = surface.trim();
            if !surface.is_empty() {
                out.push(Entity {
                    text: surface.to_string(),
                    label: open.label,
                });
            }
        }
    }

    let mut entities = Vec::new();
    let mut open: Option<Open> = None;

    for token in tags {
        match token.tag {
            BioTag::Outside => close(text, open.take(), &mut entities),
            BioTag::Inside(label) if open.as_ref().is_some_and(|o| o.label == label) => {
                if let Some(o) = open.as_mut() {
                    o.end = token.end;
                }
            }
            BioTag::Begin(label) | BioTag::Inside(label) => {
                close(text, open.take(), &mut entities);
                open = Some(Open {
                    label,
                    start: token.start,
                    end: token.end,
                });
            }
        }
    }
    close(text, open, &mut entities);
    entities
}

/// Extracts entities from article text with the service's token classifier.
pub struct EntityExtractor<'a> {
    tagger: Option<&'a dyn TokenClassifier>,
}

impl<'a> EntityExtractor<'a> {
    pub fn new(tagger: Option<&'a dyn TokenClassifier>) -> Self {
        Self { tagger }
    }

    /// Entities in `text`, left to right, each (text, label) pair once.
    ///
    /// Markup is stripped first. Tagger failures yield no entities.
    #[instrument(level = "debug", skip_all, fields(len = text.len()))]
    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let plain = strip_markup(text);
        if plain.trim().is_empty() {
            return Vec::new();
        }
        let Some(tagger) = self.tagger else {
            debug!("No token classifier loaded; skipping entity extraction");
            return Vec::new();
        };
        match tagger.tag(&plain) {
            Ok(tags) => aggregate_simple(&plain, &tags).into_iter().unique().collect(),
            Err(e) => {
                warn!(model = tagger.name(), error = %e, "Entity tagging failed");
                Vec::new()
            }
        }
    }
}

fn set(words: &[&'static str]) -> HashSet<&'static str> {
    words.iter().copied().collect()
}

static ORGANIZATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    set(&[
        "apple", "google", "alphabet", "microsoft", "amazon", "meta", "facebook", "tesla",
        "nvidia", "openai", "anthropic", "deepmind", "netflix", "disney", "boeing", "airbus",
        "intel", "amd", "ibm", "oracle", "samsung", "sony", "toyota", "ford", "general motors",
        "uber", "twitter", "spacex", "goldman sachs", "jpmorgan", "morgan stanley",
        "wells fargo", "walmart", "pfizer", "moderna", "nasa", "nato", "fbi", "cia", "who",
        "un", "eu", "imf", "opec", "fifa", "uefa", "nba", "nfl", "mlb", "nhl", "white house",
        "pentagon", "kremlin", "supreme court", "federal reserve", "fed", "european union",
        "united nations", "world health organization", "world bank", "reuters",
        "associated press", "bbc", "cnn", "fox news", "hamas", "hezbollah", "taliban",
        "democrats", "republicans", "gop", "labour", "ecb", "sec", "ftc", "doj", "wto",
        "red cross", "european central bank", "manchester united", "real madrid",
    ])
});

static LOCATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    set(&[
        // countries and regions
        "afghanistan", "argentina", "australia", "austria", "bangladesh", "belgium", "brazil",
        "canada", "chile", "china", "colombia", "cuba", "denmark", "egypt", "ethiopia",
        "finland", "france", "germany", "greece", "india", "indonesia", "iran", "iraq",
        "ireland", "israel", "italy", "japan", "jordan", "kenya", "lebanon", "libya",
        "malaysia", "mexico", "morocco", "myanmar", "nepal", "netherlands", "new zealand",
        "nigeria", "north korea", "norway", "pakistan", "palestine", "peru", "philippines",
        "poland", "portugal", "qatar", "romania", "russia", "saudi arabia", "singapore",
        "south africa", "south korea", "spain", "sudan", "sweden", "switzerland", "syria",
        "taiwan", "thailand", "turkey", "ukraine", "united kingdom", "uk", "u.k",
        "united states", "us", "u.s", "usa", "u.s.a", "united arab emirates", "uae",
        "venezuela", "vietnam", "yemen", "gaza", "west bank", "europe", "asia", "africa",
        "north america", "south america", "latin america", "middle east", "antarctica",
        // US states
        "california", "texas", "florida", "new york", "washington", "illinois", "ohio",
        "georgia", "michigan", "arizona", "pennsylvania", "north carolina", "virginia",
        "massachusetts", "colorado", "oregon", "nevada", "utah", "louisiana", "alabama",
        "tennessee", "kentucky", "minnesota", "wisconsin", "missouri", "iowa", "kansas",
        "oklahoma", "arkansas", "mississippi", "indiana", "maryland", "new jersey",
        "connecticut", "hawaii", "alaska", "maine", "vermont", "idaho", "montana", "wyoming",
        "nebraska", "south carolina", "west virginia", "new mexico", "rhode island",
        "delaware", "north dakota", "south dakota", "new hampshire",
        // cities
        "london", "paris", "berlin", "tokyo", "beijing", "shanghai", "hong kong", "moscow",
        "kyiv", "kiev", "new delhi", "delhi", "mumbai", "sydney", "melbourne", "toronto",
        "los angeles", "chicago", "houston", "san francisco", "seattle", "boston", "miami",
        "dallas", "atlanta", "dubai", "istanbul", "jerusalem", "tel aviv", "cairo", "rome",
        "madrid", "brussels", "geneva", "vienna", "seoul", "bangkok", "jakarta", "manila",
        "karachi", "lagos", "nairobi", "johannesburg", "mexico city", "sao paulo",
        "rio de janeiro", "buenos aires", "silicon valley",
    ])
});

static MISC: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    set(&[
        "american", "british", "chinese", "russian", "ukrainian", "israeli", "palestinian",
        "european", "indian", "japanese", "german", "french", "italian", "spanish",
        "canadian", "australian", "mexican", "brazilian", "iranian", "iraqi", "syrian",
        "saudi", "turkish", "korean", "african", "asian", "arab", "muslim", "christian",
        "jewish", "democrat", "republican", "olympics", "christmas", "covid", "bitcoin",
        "world cup", "super bowl", "champions league", "premier league", "iphone", "chatgpt",
        "android", "oscars", "grammys", "ramadan", "easter", "brexit",
    ])
});

static FIRST_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    set(&[
        "joe", "donald", "kamala", "elon", "jeff", "mark", "tim", "sam", "bill", "barack",
        "hillary", "vladimir", "xi", "emmanuel", "rishi", "keir", "justin", "narendra",
        "olaf", "benjamin", "volodymyr", "taylor", "john", "james", "michael", "david",
        "robert", "william", "richard", "joseph", "thomas", "charles", "mary", "jennifer",
        "linda", "elizabeth", "susan", "sarah", "jessica", "nancy", "karen", "lisa", "anna",
        "maria", "mike", "chris", "steve", "paul", "peter", "george", "jack", "kevin",
        "brian", "jerome", "janet", "ursula", "giorgia", "pete", "ron", "gavin", "ted",
        "mitch", "chuck", "kim", "boris", "lionel", "cristiano", "lebron", "serena", "novak",
        "angela",
    ])
});

static HONORIFICS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    set(&[
        "mr", "mrs", "ms", "dr", "president", "senator", "sen", "rep", "gov", "governor",
        "judge", "minister", "prime", "pm", "prince", "princess", "king", "queen", "pope",
        "ceo", "chancellor", "secretary", "gen", "coach", "sir", "lady", "lord", "mayor",
        "sheikh", "speaker",
    ])
});

/// Lowercase words allowed inside a capitalized run: `Bank of America`.
static CONNECTORS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| set(&["of", "de", "da", "del", "van", "von", "al", "bin", "la"]));

/// Last words that make a run an organization.
static ORG_SUFFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    set(&[
        "inc", "corp", "corporation", "ltd", "llc", "plc", "group", "co", "company",
        "holdings", "bank", "university", "college", "institute", "foundation", "association",
        "council", "committee", "commission", "agency", "ministry", "department", "party",
        "union", "federation", "league", "club", "fc", "airlines", "airways", "motors",
        "technologies", "labs", "news", "times", "post", "journal", "court", "senate",
        "parliament", "congress", "police", "army", "navy", "forces", "fund", "reserve",
        "board", "network", "studios", "pictures", "records", "capital", "partners",
        "ventures", "securities", "exchange", "organization", "organisation",
    ])
});

/// First words that make a run an organization: `University of Michigan`.
static ORG_HEADS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    set(&[
        "university", "ministry", "department", "bank", "council", "committee", "court",
        "parliament", "senate", "congress", "agency", "commission", "institute",
    ])
});

static LOC_SUFFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    set(&[
        "city", "county", "province", "river", "island", "islands", "valley", "street",
        "mountains", "lake", "bay", "beach", "square", "strait", "sea", "ocean", "peninsula",
        "desert", "district", "region",
    ])
});

/// Capitalized words that are never entities on their own.
static CALENDAR: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    set(&[
        "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
        "january", "february", "march", "april", "may", "june", "july", "august",
        "september", "october", "november", "december",
    ])
});

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’.&-][\p{L}\p{N}]+)*").unwrap());

const SENTENCE_BREAKS: &[char] = &['.', '!', '?', ':', ';', '\n', '|'];

/// A token of the input with the context the heuristics need.
#[derive(Debug)]
struct Word<'t> {
    start: usize,
    end: usize,
    text: &'t str,
    lower: String,
    /// Only whitespace separates this word from the previous one.
    joined: bool,
    sentence: usize,
    sentence_start: bool,
}

impl Word<'_> {
    fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }

    fn is_acronym(&self) -> bool {
        let letters: Vec<char> = self.text.chars().filter(|c| c.is_alphabetic()).collect();
        letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
    }

    fn is_candidate(&self) -> bool {
        if !self.is_capitalized() || CALENDAR.contains(self.lower.as_str()) {
            return false;
        }
        self.is_acronym()
            || !is_stopword(&self.lower)
            || ORG_SUFFIXES.contains(self.lower.as_str())
    }

    fn is_connector(&self) -> bool {
        !self.is_capitalized() && CONNECTORS.contains(self.lower.as_str())
    }

    fn is_honorific(&self) -> bool {
        HONORIFICS.contains(self.lower.trim_end_matches('.'))
    }
}

fn split_words(text: &str) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut prev_end = 0;
    let mut sentence = 0;

    for m in WORD_RE.find_iter(text) {
        let mut end = m.end();
        let mut token = m.as_str();
        for possessive in ["'s", "’s"] {
            if let Some(stripped) = token.strip_suffix(possessive) {
                end -= possessive.len();
                token = stripped;
            }
        }
        let gap = &text[prev_end..m.start()];
        let breaks = words.is_empty() || gap.contains(SENTENCE_BREAKS) || gap.contains(" - ");
        if breaks && !words.is_empty() {
            sentence += 1;
        }
        words.push(Word {
            start: m.start(),
            end,
            text: token,
            lower: token.to_lowercase(),
            joined: !words.is_empty() && gap.chars().all(char::is_whitespace),
            sentence,
            sentence_start: breaks,
        });
        prev_end = m.end();
    }
    words
}

/// Sentences where nearly every content word is capitalized (headline style).
fn title_case_sentences(words: &[Word<'_>]) -> HashSet<usize> {
    let mut stats: std::collections::HashMap<usize, (usize, usize)> = Default::default();
    for w in words {
        if w.text.chars().next().is_some_and(char::is_alphabetic) && !is_stopword(&w.lower) {
            let entry = stats.entry(w.sentence).or_default();
            entry.0 += 1;
            if w.is_capitalized() {
                entry.1 += 1;
            }
        }
    }
    stats
        .into_iter()
        .filter(|(_, (content, capitalized))| *content >= 3 && *capitalized * 5 >= *content * 4)
        .map(|(sentence, _)| sentence)
        .collect()
}

fn gazetteer_label(phrase: &str) -> Option<EntityLabel> {
    if ORGANIZATIONS.contains(phrase) {
        Some(EntityLabel::Organization)
    } else if LOCATIONS.contains(phrase) {
        Some(EntityLabel::Location)
    } else if MISC.contains(phrase) {
        Some(EntityLabel::Misc)
    } else {
        None
    }
}

/// Longest gazetteer matches inside `words[from..=to]`, left to right.
fn gazetteer_spans(words: &[Word<'_>], from: usize, to: usize) -> Vec<(usize, usize, EntityLabel)> {
    const MAX_SPAN: usize = 4;
    let mut spans = Vec::new();
    let mut k = from;
    while k <= to {
        let longest = (1..=MAX_SPAN.min(to - k + 1)).rev().find_map(|len| {
            let phrase = words[k..k + len].iter().map(|w| w.lower.as_str()).join(" ");
            gazetteer_label(&phrase).map(|label| (len, label))
        });
        match longest {
            Some((len, label)) => {
                spans.push((k, k + len - 1, label));
                k += len;
            }
            None => k += 1,
        }
    }
    spans
}

/// Label for a run of words, and whether the evidence is strong.
fn label_run(words: &[&Word<'_>], after_honorific: bool) -> (EntityLabel, bool) {
    let full = words.iter().map(|w| w.lower.as_str()).join(" ");
    let first = words[0].lower.as_str();
    let last = words[words.len() - 1].lower.as_str();

    if after_honorific {
        return (EntityLabel::Person, true);
    }
    if let Some(label) = gazetteer_label(&full) {
        return (label, true);
    }
    if words.len() > 1 && (ORG_SUFFIXES.contains(last) || ORG_HEADS.contains(first)) {
        return (EntityLabel::Organization, true);
    }
    if words.len() > 1 && LOC_SUFFIXES.contains(last) {
        return (EntityLabel::Location, true);
    }
    if words.len() == 1 && words[0].is_acronym() {
        return (EntityLabel::Organization, true);
    }
    if (2..=3).contains(&words.len()) && FIRST_NAMES.contains(first) {
        return (EntityLabel::Person, true);
    }
    if (2..=3).contains(&words.len()) && words.iter().all(|w| w.is_capitalized()) {
        return (EntityLabel::Person, false);
    }
    (EntityLabel::Misc, false)
}

/// Built-in [`TokenClassifier`] driven by capitalization and gazetteers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GazetteerTagger;

impl TokenClassifier for GazetteerTagger {
    fn name(&self) -> &str {
        "gazetteer"
    }

    fn tag(&self, text: &str) -> Result<Vec<TokenTag>, ModelError> {
        let words = split_words(text);
        let title_case = title_case_sentences(&words);
        let mut tags: Vec<BioTag> = vec![BioTag::Outside; words.len()];

        let mut i = 0;
        while i < words.len() {
            if !words[i].is_candidate() {
                i += 1;
                continue;
            }
            // Grow the run over joined candidates and inner connectors.
            let start = i;
            let mut end = i;
            let mut j = i + 1;
            while j < words.len() && words[j].joined {
                if words[j].is_candidate() {
                    end = j;
                    j += 1;
                } else if words[j].is_connector()
                    && j + 1 < words.len()
                    && words[j + 1].joined
                    && words[j + 1].is_candidate()
                {
                    end = j + 1;
                    j += 2;
                } else {
                    break;
                }
            }
            i = end + 1;

            let mut first = start;
            while first < end && words[first].is_honorific() {
                first += 1;
            }
            if first == end && words[first].is_honorific() {
                continue;
            }
            let after_honorific = first > start;
            let run: Vec<&Word<'_>> = words[first..=end].iter().collect();
            let (label, strong) = label_run(&run, after_honorific);

            let spans = if strong
                || !(title_case.contains(&words[first].sentence)
                    || (run.len() == 1 && words[first].sentence_start))
            {
                vec![(first, end, label)]
            } else {
                // Weak evidence in headline-style text: keep known names only.
                gazetteer_spans(&words, first, end)
            };
            for (from, to, label) in spans {
                tags[from] = BioTag::Begin(label);
                for tag in &mut tags[from + 1..=to] {
                    *tag = BioTag::Inside(label);
                }
            }
        }

        Ok(words
            .iter()
            .zip(tags)
            .map(|(w, tag)| TokenTag {
                start: w.start,
                end: w.end,
                tag,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(text: &str, label: EntityLabel) -> Entity {
        Entity {
            text: text.to_string(),
            label,
        }
    }

    fn extract(text: &str) -> Vec<Entity> {
        EntityExtractor::new(Some(&GazetteerTagger)).extract(text)
    }

    #[test]
    fn test_simple_aggregation_merges_inside_tokens() {
        let text = "New York Times reporter";
        let tags = [
            TokenTag { start: 0, end: 3, tag: BioTag::Begin(EntityLabel::Organization) },
            TokenTag { start: 4, end: 8, tag: BioTag::Inside(EntityLabel::Organization) },
            TokenTag { start: 9, end: 14, tag: BioTag::Inside(EntityLabel::Organization) },
            TokenTag { start: 15, end: 23, tag: BioTag::Outside },
        ];
        assert_eq!(
            aggregate_simple(text, &tags),
            vec![entity("New York Times", EntityLabel::Organization)]
        );
    }

    #[test]
    fn test_simple_aggregation_splits_on_label_change_and_begin() {
        let text = "Angela Merkel Berlin Paris";
        let tags = [
            TokenTag { start: 0, end: 6, tag: BioTag::Begin(EntityLabel::Person) },
            TokenTag { start: 7, end: 13, tag: BioTag::Inside(EntityLabel::Person) },
            TokenTag { start: 14, end: 20, tag: BioTag::Inside(EntityLabel::Location) },
            TokenTag { start: 21, end: 26, tag: BioTag::Begin(EntityLabel::Location) },
        ];
        assert_eq!(
            aggregate_simple(text, &tags),
            vec![
                entity("Angela Merkel", EntityLabel::Person),
                entity("Berlin", EntityLabel::Location),
                entity("Paris", EntityLabel::Location),
            ]
        );
    }

    #[test]
    fn test_simple_aggregation_ignores_bad_offsets() {
        let tags = [TokenTag { start: 5, end: 50, tag: BioTag::Begin(EntityLabel::Misc) }];
        assert!(aggregate_simple("short", &tags).is_empty());
    }

    #[test]
    fn test_extract_empty() {
        assert!(extract("").is_empty());
        assert!(extract("   ").is_empty());
        assert!(EntityExtractor::new(None).extract("Joe Biden").is_empty());
    }

    #[test]
    fn test_people_places_and_demonyms() {
        assert_eq!(
            extract("President Joe Biden met Ukrainian officials in Kyiv on Tuesday."),
            vec![
                entity("Joe Biden", EntityLabel::Person),
                entity("Ukrainian", EntityLabel::Misc),
                entity("Kyiv", EntityLabel::Location),
            ]
        );
    }

    #[test]
    fn test_organizations() {
        assert_eq!(
            extract("Apple and Microsoft shares rose, the Federal Reserve said."),
            vec![
                entity("Apple", EntityLabel::Organization),
                entity("Microsoft", EntityLabel::Organization),
                entity("Federal Reserve", EntityLabel::Organization),
            ]
        );
    }

    #[test]
    fn test_connectors_and_possessives() {
        assert_eq!(
            extract("Bank of America cut fees as Tesla's sales fell in Germany"),
            vec![
                entity("Bank of America", EntityLabel::Organization),
                entity("Tesla", EntityLabel::Organization),
                entity("Germany", EntityLabel::Location),
            ]
        );
    }

    #[test]
    fn test_repeated_entities_reported_once() {
        assert_eq!(
            extract("NATO allies met in Brussels. NATO said more talks are planned"),
            vec![
                entity("NATO", EntityLabel::Organization),
                entity("Brussels", EntityLabel::Location),
            ]
        );
    }

    #[test]
    fn test_markup_is_stripped_first() {
        assert_eq!(
            extract("<b>Reuters</b> reports from <a href=\"https://x\">London</a>"),
            vec![
                entity("Reuters", EntityLabel::Organization),
                entity("London", EntityLabel::Location),
            ]
        );
    }

    #[test]
    fn test_title_case_headline_keeps_only_strong_matches() {
        assert_eq!(
            extract("Stocks Rally As Investors Cheer Nvidia Earnings Beat"),
            vec![entity("Nvidia", EntityLabel::Organization)]
        );
    }
}
