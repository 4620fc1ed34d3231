//! Tokenization and word counting.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::stopwords::StopWords;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w[\w']*").expect("token pattern is a valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerOptions {
    pub include_numbers: bool,
    pub normalize_plurals: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            include_numbers: false,
            normalize_plurals: true,
        }
    }
}

/// Splits `text` into words and drops stop words and (optionally) numbers.
pub fn tokenize<'a>(
    text: &'a str,
    stopwords: &StopWords,
    options: TokenizerOptions,
) -> Vec<&'a str> {
    TOKEN
        .find_iter(text)
        .map(|m| strip_possessive(m.as_str()))
        .filter(|w| !w.is_empty())
        .filter(|w| options.include_numbers || !w.chars().all(char::is_numeric))
        .filter(|w| !stopwords.contains(w))
        .collect()
}

fn strip_possessive(word: &str) -> &str {
    let n = word.len();
    if n >= 2 && word.is_char_boundary(n - 2) && word[n - 2..].eq_ignore_ascii_case("'s") {
        &word[..n - 2]
    } else {
        word
    }
}

/// Counts tokens. Case variants are fused under their most frequent
/// spelling; plurals fold into an existing singular when enabled. Sorted by
/// count, descending, ties by word.
pub fn count_words(tokens: &[&str], normalize_plurals: bool) -> Vec<(String, usize)> {
    let mut by_lower: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for token in tokens {
        *by_lower
            .entry(token.to_lowercase())
            .or_default()
            .entry((*token).to_string())
            .or_default() += 1;
    }

    if normalize_plurals {
        let plurals: Vec<String> = by_lower
            .keys()
            .filter(|k| k.ends_with('s') && !k.ends_with("ss"))
            .filter(|k| by_lower.contains_key(&k[..k.len() - 1]))
            .cloned()
            .collect();
        for plural in plurals {
            let Some(variants) = by_lower.remove(&plural) else {
                continue;
            };
            let singular = by_lower.entry(plural[..plural.len() - 1].to_string()).or_default();
            for (word, count) in variants {
                let mut stem = word;
                stem.pop();
                *singular.entry(stem).or_default() += count;
            }
        }
    }

    let mut counts: Vec<(String, usize)> = by_lower
        .into_values()
        .filter_map(|variants| {
            let total = variants.values().sum();
            let mut best: Option<(String, usize)> = None;
            for (word, count) in variants {
                if best.as_ref().is_none_or(|(_, c)| count > *c) {
                    best = Some((word, count));
                }
            }
            best.map(|(word, _)| (word, total))
        })
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
    /// Count relative to the most frequent word, in `(0, 1]`.
    pub weight: f32,
}

/// The top `max_words` words with normalized weights, most frequent first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordFrequencies {
    entries: Vec<WordFrequency>,
}

impl WordFrequencies {
    pub fn from_text(
        text: &str,
        stopwords: &StopWords,
        options: TokenizerOptions,
        max_words: usize,
    ) -> Self {
        let tokens = tokenize(text, stopwords, options);
        Self::from_counts(count_words(&tokens, options.normalize_plurals), max_words)
    }

    /// `counts` need not be sorted.
    pub fn from_counts(mut counts: Vec<(String, usize)>, max_words: usize) -> Self {
        counts.retain(|(_, c)| *c > 0);
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(max_words);

        let max = counts.first().map(|(_, c)| *c).unwrap_or(1) as f32;
        let entries = counts
            .into_iter()
            .map(|(word, count)| WordFrequency {
                word,
                count,
                weight: count as f32 / max,
            })
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordFrequency> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[WordFrequency] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn truncated(&self, n: usize) -> Self {
        Self {
            entries: self.entries.iter().take(n).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        tokenize(text, &StopWords::empty(), TokenizerOptions::default())
    }

    #[test]
    fn tokenizes_arabic_and_latin() {
        assert_eq!(words("قال شهريار: hello, world!"), ["قال", "شهريار", "hello", "world"]);
    }

    #[test]
    fn drops_possessive_suffix_and_numbers() {
        assert_eq!(words("Jabir's 1001 nights ٢٠١٨"), ["Jabir", "nights"]);
    }

    #[test]
    fn keeps_numbers_when_asked() {
        let opts = TokenizerOptions {
            include_numbers: true,
            ..TokenizerOptions::default()
        };
        assert_eq!(tokenize("1001 nights", &StopWords::empty(), opts), ["1001", "nights"]);
    }

    #[test]
    fn filters_stop_words_case_insensitively() {
        let stop: StopWords = ["the", "في"].into_iter().collect();
        let toks = tokenize("The king في القصر", &stop, TokenizerOptions::default());
        assert_eq!(toks, ["king", "القصر"]);
    }

    #[test]
    fn fuses_case_variants_under_most_common() {
        let counts = count_words(&["Rust", "rust", "Rust", "RUST"], false);
        assert_eq!(counts, vec![("Rust".to_string(), 4)]);
    }

    #[test]
    fn folds_plurals_into_existing_singular() {
        let counts = count_words(&["night", "nights", "nights", "glass", "glas"], true);
        assert!(counts.contains(&("night".to_string(), 3)));
        // "ss" endings are not plurals.
        assert!(counts.contains(&("glass".to_string(), 1)));
        assert!(counts.contains(&("glas".to_string(), 1)));
    }

    #[test]
    fn plural_without_singular_is_kept() {
        let counts = count_words(&["nights"], true);
        assert_eq!(counts, vec![("nights".to_string(), 1)]);
    }

    #[test]
    fn weights_are_relative_to_top_word_and_capped() {
        let freqs = WordFrequencies::from_counts(
            vec![
                ("b".into(), 2),
                ("a".into(), 4),
                ("c".into(), 1),
                ("zero".into(), 0),
            ],
            2,
        );
        let got: Vec<_> = freqs.iter().map(|f| (f.word.as_str(), f.weight)).collect();
        assert_eq!(got, vec![("a", 1.0), ("b", 0.5)]);
    }

    #[test]
    fn ties_are_ordered_by_word() {
        let freqs = WordFrequencies::from_counts(vec![("z".into(), 1), ("m".into(), 1)], 10);
        let order: Vec<_> = freqs.iter().map(|f| f.word.clone()).collect();
        assert_eq!(order, ["m", "z"]);
    }

    #[test]
    fn from_text_counts_repeated_arabic_word() {
        let freqs = WordFrequencies::from_text(
            "ليلة ليلة ليلة ألف",
            &StopWords::empty(),
            TokenizerOptions::default(),
            10,
        );
        assert_eq!(freqs.as_slice()[0].word, "ليلة");
        assert_eq!(freqs.as_slice()[0].count, 3);
        assert_eq!(freqs.len(), 2);
    }
}
