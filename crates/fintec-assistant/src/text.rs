//! Message normalisation and whole-word phrase matching.

use std::sync::LazyLock;

use regex::Regex;

/// Decimal-comma amounts ("12,50", "1.250,75") or dotted numbers.
pub(crate) const NUMBER: &str = r"\d+(?:\.\d{3})*,\d{1,2}\b|\d+(?:\.\d+)*";

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{NUMBER}|[\p{{L}}\p{{N}}]+")).expect("token pattern is valid")
});

/// Lower-case `input` and strip Spanish diacritics.
pub fn fold(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .map(|ch| match ch {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    /// Slice of the original message.
    pub raw: &'a str,
    pub folded: String,
}

impl Token<'_> {
    pub fn is_number(&self) -> bool {
        self.folded
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == '.' || ch == ',')
    }
}

/// A user message split into word and number tokens.
#[derive(Debug, Clone)]
pub(crate) struct Message<'a> {
    pub original: &'a str,
    /// Whole message folded, for pattern extractors.
    pub folded: String,
    pub tokens: Vec<Token<'a>>,
    words: Vec<String>,
}

impl<'a> Message<'a> {
    pub fn new(original: &'a str) -> Self {
        let tokens: Vec<Token<'a>> = TOKEN
            .find_iter(original)
            .map(|found| Token {
                raw: found.as_str(),
                folded: fold(found.as_str()),
            })
            .collect();
        let words = tokens.iter().map(|token| token.folded.clone()).collect();

        Self {
            original,
            folded: fold(original.trim()),
            tokens,
            words,
        }
    }

    pub fn contains(&self, phrase: &Phrase) -> bool {
        let needle = phrase.words();
        !needle.is_empty()
            && self
                .words
                .windows(needle.len())
                .any(|window| window == needle)
    }

    pub fn contains_any(&self, phrases: &PhraseSet) -> bool {
        phrases.iter().any(|phrase| self.contains(phrase))
    }
}

/// A folded, tokenised keyword of one or more words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Phrase(Vec<String>);

impl Phrase {
    pub fn new(text: &str) -> Self {
        Self(
            TOKEN
                .find_iter(text)
                .map(|found| fold(found.as_str()))
                .collect(),
        )
    }

    pub fn words(&self) -> &[String] {
        &self.0
    }

    /// The single word this phrase consists of, if it is one word long.
    pub fn as_word(&self) -> Option<&str> {
        match self.0.as_slice() {
            [word] => Some(word.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PhraseSet(Vec<Phrase>);

impl PhraseSet {
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
        Self(
            entries
                .iter()
                .map(|entry| Phrase::new(entry.as_ref()))
                .filter(|phrase| !phrase.words().is_empty())
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &Phrase> {
        self.0.iter()
    }

    /// Whether `word` equals one of the single-word entries.
    pub fn has_word(&self, word: &str) -> bool {
        self.0.iter().any(|phrase| phrase.as_word() == Some(word))
    }
}
