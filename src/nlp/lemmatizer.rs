//! Rule-based English lemmatizer.
//!
//! Two entry points mirror the two normalization passes:
//!
//! - [`noun_lemma`]: dictionary-default lemmatization, everything is treated
//!   as a noun (plural suffixes and irregular plurals only).
//! - [`lemmatize`]: part-of-speech-aware lemmatization. Each step guesses
//!   whether the word carries a verb inflection (`-ing`, `-ed`, irregular past
//!   forms) and strips it, otherwise it falls back to the noun rules.
//!
//! Both functions iterate their rules to a fixed point, so feeding a lemma
//! back in returns it unchanged.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Coarse part of speech used to pick a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Verb,
}

static IRREGULAR_NOUNS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("mice", "mouse"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("wives", "wife"),
        ("lives", "life"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("wolves", "wolf"),
        ("halves", "half"),
        ("shelves", "shelf"),
        ("thieves", "thief"),
        ("crises", "crisis"),
        ("analyses", "analysis"),
        ("theses", "thesis"),
        ("diagnoses", "diagnosis"),
        ("hypotheses", "hypothesis"),
        ("heroes", "hero"),
        ("potatoes", "potato"),
        ("tomatoes", "tomato"),
        ("echoes", "echo"),
        ("vetoes", "veto"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("indices", "index"),
        ("matrices", "matrix"),
        ("chairmen", "chairman"),
        ("businessmen", "businessman"),
        ("spokesmen", "spokesman"),
        ("spokeswomen", "spokeswoman"),
        ("policemen", "policeman"),
        ("congressmen", "congressman"),
        ("firemen", "fireman"),
        ("gunmen", "gunman"),
        ("countrymen", "countryman"),
    ]
    .into_iter()
    .collect()
});

/// Words that end in `s` without being plurals.
static NOUN_INVARIANT: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "news", "series", "species", "means", "lens", "politics", "economics", "physics",
        "mathematics", "athletics", "ethics", "olympics", "headquarters", "diabetes", "measles",
        "whereabouts", "texas", "kansas", "arkansas", "vegas", "christmas", "canvas", "atlas",
        "alias", "bias", "chaos", "cosmos", "hamas", "mars", "athens", "brussels", "wales",
        "netherlands", "philippines", "bahamas", "seychelles", "maldives", "barbados",
        "honduras", "dallas", "memphis", "james", "charles", "reuters", "aires", "los",
    ]
    .into_iter()
    .collect()
});

static IRREGULAR_VERBS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("went", "go"),
        ("gone", "go"),
        ("going", "go"),
        ("said", "say"),
        ("says", "say"),
        ("seen", "see"),
        ("led", "lead"),
        ("fed", "feed"),
        ("bred", "breed"),
        ("fled", "flee"),
        ("sped", "speed"),
        ("held", "hold"),
        ("sold", "sell"),
        ("told", "tell"),
        ("paid", "pay"),
        ("met", "meet"),
        ("ran", "run"),
        ("began", "begin"),
        ("begun", "begin"),
        ("came", "come"),
        ("gave", "give"),
        ("given", "give"),
        ("took", "take"),
        ("taken", "take"),
        ("thought", "think"),
        ("bought", "buy"),
        ("brought", "bring"),
        ("caught", "catch"),
        ("taught", "teach"),
        ("fought", "fight"),
        ("sought", "seek"),
        ("built", "build"),
        ("sent", "send"),
        ("spent", "spend"),
        ("lent", "lend"),
        ("meant", "mean"),
        ("felt", "feel"),
        ("kept", "keep"),
        ("slept", "sleep"),
        ("swept", "sweep"),
        ("wept", "weep"),
        ("dealt", "deal"),
        ("sat", "sit"),
        ("stood", "stand"),
        ("understood", "understand"),
        ("struck", "strike"),
        ("stuck", "stick"),
        ("hung", "hang"),
        ("swung", "swing"),
        ("spun", "spin"),
        ("dug", "dig"),
        ("hid", "hide"),
        ("hidden", "hide"),
        ("rode", "ride"),
        ("ridden", "ride"),
        ("wrote", "write"),
        ("written", "write"),
        ("drove", "drive"),
        ("driven", "drive"),
        ("chose", "choose"),
        ("chosen", "choose"),
        ("froze", "freeze"),
        ("frozen", "freeze"),
        ("broke", "break"),
        ("broken", "break"),
        ("stole", "steal"),
        ("stolen", "steal"),
        ("woke", "wake"),
        ("woken", "wake"),
        ("spoke", "speak"),
        ("spoken", "speak"),
        ("fell", "fall"),
        ("fallen", "fall"),
        ("flew", "fly"),
        ("flown", "fly"),
        ("grew", "grow"),
        ("grown", "grow"),
        ("knew", "know"),
        ("known", "know"),
        ("threw", "throw"),
        ("thrown", "throw"),
        ("drew", "draw"),
        ("drawn", "draw"),
        ("withdrew", "withdraw"),
        ("withdrawn", "withdraw"),
        ("ate", "eat"),
        ("eaten", "eat"),
        ("forgot", "forget"),
        ("forgotten", "forget"),
        ("gotten", "get"),
        ("shot", "shoot"),
        ("sang", "sing"),
        ("sung", "sing"),
        ("sank", "sink"),
        ("sunk", "sink"),
        ("swam", "swim"),
        ("wore", "wear"),
        ("worn", "wear"),
        ("torn", "tear"),
        ("shook", "shake"),
        ("shaken", "shake"),
        ("forgave", "forgive"),
        ("forgiven", "forgive"),
        ("arose", "arise"),
        ("arisen", "arise"),
        ("overtook", "overtake"),
        ("undertook", "undertake"),
        ("mistook", "mistake"),
        ("beaten", "beat"),
        ("bitten", "bite"),
        ("slid", "slide"),
        ("shone", "shine"),
        ("shrank", "shrink"),
        ("sprang", "spring"),
        ("stung", "sting"),
        ("swore", "swear"),
        ("sworn", "swear"),
        ("dying", "die"),
        ("lying", "lie"),
        ("tying", "tie"),
    ]
    .into_iter()
    .collect()
});

/// `-ing` and `-ed` words that are nouns or adjectives in news text.
static INFLECTION_KEEP: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "morning", "evening", "building", "meeting", "wedding", "ceiling", "nothing",
        "something", "everything", "anything", "during", "beijing", "sterling", "viking",
        "darling", "briefing", "hearing", "funding", "housing", "clothing", "shooting",
        "bombing", "ruling", "landing", "warning", "opening", "listing", "holding", "filing",
        "pudding", "offspring", "lightning", "sibling", "inning", "awning", "ceiling",
        "kindred", "sacred", "naked", "wicked", "rugged", "beloved", "hundred", "mohammed",
        "ahmed", "proceed", "succeed", "exceed",
    ]
    .into_iter()
    .collect()
});

/// Stems that need a trailing `e` back but no suffix rule catches.
static E_STEMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["chang", "arrang", "exchang", "challeng", "creat", "manag", "plung"]
        .into_iter()
        .collect()
});

/// Stems ending in `s` that are complete words.
static S_STEMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["focus", "bias", "gas", "bus", "plus", "atlas", "canvas"]
        .into_iter()
        .collect()
});

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn has_vowel(s: &str) -> bool {
    s.bytes().any(|c| is_vowel(c) || c == b'y')
}

/// Guess the part of speech of a single lowercase token from its inflection.
pub fn guess_pos(word: &str) -> PartOfSpeech {
    if verb_step(word).is_some() {
        PartOfSpeech::Verb
    } else {
        PartOfSpeech::Noun
    }
}

/// Lemmatize `word` as a noun.
pub fn noun_lemma(word: &str) -> String {
    fixed_point(word, |w| noun_step(w).unwrap_or_else(|| w.to_string()))
}

/// Lemmatize `word`, picking noun or verb rules from its inflection.
pub fn lemmatize(word: &str) -> String {
    fixed_point(word, |w| match guess_pos(w) {
        PartOfSpeech::Verb => verb_step(w).unwrap_or_else(|| w.to_string()),
        PartOfSpeech::Noun => noun_step(w).unwrap_or_else(|| w.to_string()),
    })
}

fn fixed_point(word: &str, step: impl Fn(&str) -> String) -> String {
    let mut current = word.to_string();
    loop {
        let next = step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One noun rule application, `None` when nothing applies.
fn noun_step(word: &str) -> Option<String> {
    if let Some(lemma) = IRREGULAR_NOUNS.get(word) {
        return Some(lemma.to_string());
    }
    if word.len() <= 3 || NOUN_INVARIANT.contains(word) {
        return None;
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return None;
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if word.len() > 4 {
            return Some(format!("{stem}y"));
        }
        return Some(word[..word.len() - 1].to_string());
    }
    for suffix in ["sses", "ches", "shes", "xes", "zes"] {
        if word.ends_with(suffix) {
            return Some(word[..word.len() - 2].to_string());
        }
    }
    word.strip_suffix('s').map(str::to_string)
}

/// One verb rule application, `None` when the word carries no verb inflection.
fn verb_step(word: &str) -> Option<String> {
    if let Some(lemma) = IRREGULAR_VERBS.get(word) {
        return Some(lemma.to_string());
    }
    if INFLECTION_KEEP.contains(word) {
        return None;
    }
    if word.len() >= 5 {
        if let Some(stem) = word.strip_suffix("ing") {
            return has_vowel(stem).then(|| restore_stem(stem));
        }
    }
    if word.ends_with("eed") {
        // agreed -> agree, but need/feed/speed stay
        return (word.len() > 5).then(|| word[..word.len() - 1].to_string());
    }
    if word.len() >= 5 {
        if let Some(stem) = word.strip_suffix("ied") {
            return Some(format!("{stem}y"));
        }
    }
    if word.len() >= 4 {
        if let Some(stem) = word.strip_suffix("ed") {
            return has_vowel(stem).then(|| restore_stem(stem));
        }
    }
    None
}

/// Rebuild a dictionary form from a stem left after stripping `-ing`/`-ed`.
fn restore_stem(stem: &str) -> String {
    let b = stem.as_bytes();
    let n = b.len();

    if n <= 2 {
        // us(ing) -> use, di(ed) -> die
        return format!("{stem}e");
    }
    if E_STEMS.contains(stem) {
        return format!("{stem}e");
    }
    let (last, prev) = (b[n - 1], b[n - 2]);

    // stopp -> stop, plann -> plan, but fall/pass/buzz/add stay
    if n >= 4 && last == prev && !is_vowel(last) && !matches!(last, b'l' | b's' | b'z') {
        return stem[..n - 1].to_string();
    }
    if last == b's' && prev != b's' && !S_STEMS.contains(stem) {
        return format!("{stem}e");
    }
    let needs_e = match (prev, last) {
        (_, b'v') | (_, b'c') => true,
        (p, b'z') => p != b'z',
        (b'a', b't') => !is_vowel(b[n - 3]),
        (b'a', b'g') => true,
        (b'r' | b'd', b'g') => true,
        (b'u' | b'i', b'r') | (b'u', b't') | (b'i', b'n') => !is_vowel(b[n - 3]),
        (b'b' | b'c' | b'd' | b'f' | b'g' | b'k' | b'p' | b't' | b'z', b'l') => true,
        _ => false,
    };
    if needs_e {
        return format!("{stem}e");
    }
    // short consonant-vowel-consonant stems: mak -> make, writ -> write
    let cvc = (3..=4).contains(&n)
        && !is_vowel(b[0])
        && !is_vowel(last)
        && matches!(prev, b'a' | b'i' | b'o' | b'u')
        && !is_vowel(b[n - 3])
        && !matches!(last, b'w' | b'x' | b'y');
    if cvc {
        return format!("{stem}e");
    }
    stem.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noun_plurals() {
        assert_eq!(noun_lemma("markets"), "market");
        assert_eq!(noun_lemma("companies"), "company");
        assert_eq!(noun_lemma("ties"), "tie");
        assert_eq!(noun_lemma("taxes"), "tax");
        assert_eq!(noun_lemma("churches"), "church");
        assert_eq!(noun_lemma("children"), "child");
        assert_eq!(noun_lemma("crises"), "crisis");
    }

    #[test]
    fn test_noun_invariants() {
        assert_eq!(noun_lemma("news"), "news");
        assert_eq!(noun_lemma("process"), "process");
        assert_eq!(noun_lemma("status"), "status");
        assert_eq!(noun_lemma("analysis"), "analysis");
        assert_eq!(noun_lemma("texas"), "texas");
        assert_eq!(noun_lemma("gas"), "gas");
    }

    #[test]
    fn test_noun_lemma_leaves_verbs_alone() {
        assert_eq!(noun_lemma("running"), "running");
        assert_eq!(noun_lemma("rallied"), "rallied");
    }

    #[test]
    fn test_verb_inflections() {
        assert_eq!(lemmatize("running"), "run");
        assert_eq!(lemmatize("stopped"), "stop");
        assert_eq!(lemmatize("making"), "make");
        assert_eq!(lemmatize("writing"), "write");
        assert_eq!(lemmatize("created"), "create");
        assert_eq!(lemmatize("raised"), "raise");
        assert_eq!(lemmatize("rallied"), "rally");
        assert_eq!(lemmatize("agreed"), "agree");
        assert_eq!(lemmatize("visited"), "visit");
        assert_eq!(lemmatize("treated"), "treat");
        assert_eq!(lemmatize("killed"), "kill");
        assert_eq!(lemmatize("injured"), "injure");
        assert_eq!(lemmatize("used"), "use");
        assert_eq!(lemmatize("focused"), "focus");
        assert_eq!(lemmatize("opening"), "opening");
    }

    #[test]
    fn test_irregular_verbs() {
        assert_eq!(lemmatize("said"), "say");
        assert_eq!(lemmatize("brought"), "bring");
        assert_eq!(lemmatize("fell"), "fall");
        assert_eq!(lemmatize("sped"), "speed");
    }

    #[test]
    fn test_words_without_inflection() {
        assert_eq!(lemmatize("thing"), "thing");
        assert_eq!(lemmatize("king"), "king");
        assert_eq!(lemmatize("need"), "need");
        assert_eq!(lemmatize("bed"), "bed");
        assert_eq!(lemmatize("string"), "string");
    }

    #[test]
    fn test_plural_verb_forms() {
        assert_eq!(lemmatize("meetings"), "meeting");
        assert_eq!(lemmatize("earnings"), "earn");
    }

    #[test]
    fn test_lemmas_are_fixed_points() {
        for word in [
            "running", "companies", "created", "said", "earnings", "meetings", "stockings",
            "embedded", "focused", "increasing", "changes",
        ] {
            let once = lemmatize(word);
            assert_eq!(lemmatize(&once), once, "{word}");
            assert_eq!(noun_lemma(&once), once, "{word}");
        }
    }

    #[test]
    fn test_guess_pos() {
        assert_eq!(guess_pos("voted"), PartOfSpeech::Verb);
        assert_eq!(guess_pos("election"), PartOfSpeech::Noun);
        assert_eq!(guess_pos("morning"), PartOfSpeech::Noun);
    }
}
