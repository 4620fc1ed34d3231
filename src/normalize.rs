//! Arabic text normalization.
//!
//! Only diacritics are removed. Letter forms, punctuation and whitespace are
//! left untouched; tokenization happens later in [`crate::frequency`].

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Arabic combining marks: Quranic annotation signs, harakat, superscript
/// alef and the small high/low marks of the extended block.
const DIACRITIC_CLASS: &str =
    "[\u{0610}-\u{061A}\u{064B}-\u{065F}\u{0670}\u{06D6}-\u{06DC}\u{06DF}-\u{06E8}\u{06EA}-\u{06ED}]";

static DIACRITICS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DIACRITIC_CLASS).expect("diacritic class is a valid regex"));

/// Strips Arabic diacritics. Idempotent.
pub fn normalize(text: &str) -> String {
    DIACRITICS.replace_all(text, "").into_owned()
}

/// Whether `c` falls in one of the stripped ranges.
pub fn is_diacritic(c: char) -> bool {
    matches!(
        c,
        '\u{0610}'..='\u{061A}'
            | '\u{064B}'..='\u{065F}'
            | '\u{0670}'
            | '\u{06D6}'..='\u{06DC}'
            | '\u{06DF}'..='\u{06E8}'
            | '\u{06EA}'..='\u{06ED}'
    )
}

/// A loaded text file together with its normalized form.
#[derive(Debug, Clone)]
pub struct TextDocument {
    title: String,
    raw: String,
    normalized: String,
}

impl TextDocument {
    pub fn new(title: impl Into<String>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self {
            title: title.into(),
            raw,
            normalized,
        }
    }

    /// Reads a UTF-8 file. The title is the file stem, which also names the
    /// rendered output.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wordcloud".to_string());
        Ok(Self::new(title, raw))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}
