use log::warn;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::{fmt, fs};
use unicode_normalization::UnicodeNormalization;

use crate::types::{GlyphId, WordId};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// A struct representing a word in the word list.
#[derive(Debug, Clone)]
pub struct Word {
    /// The word as it would appear in a grid -- only uppercase letters or other valid glyphs.
    pub normalized_string: String,

    /// The word as it appears in the user's word list, with arbitrary formatting.
    pub canonical_string: String,

    /// The glyph ids making up `normalized_string`.
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The number of cells this word occupies in a grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The glyph this word places in the given cell, or `None` if the word is too short to reach
    /// it.
    #[must_use]
    pub fn glyph_at(&self, cell_idx: usize) -> Option<GlyphId> {
        self.glyphs.get(cell_idx).copied()
    }
}

/// Given a canonical word string from a dictionary file, turn it into the normalized form we'll
/// use in the actual fill engine.
#[must_use]
pub fn normalize_word(canonical: &str) -> String {
    canonical
        .nfc() // Normalize Unicode combining forms
        .flat_map(char::to_uppercase)
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordListError {
    InvalidPath(String),
    InvalidWord(String),
}

impl fmt::Display for WordListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            WordListError::InvalidPath(path) => format!("Can’t read file: “{path}”"),
            WordListError::InvalidWord(word) => {
                format!("Word list contains invalid word: “{word}”")
            }
        };
        write!(f, "{string}")
    }
}

impl std::error::Error for WordListError {}

/// The vocabulary available to the solver. Each distinct normalized word appears exactly once, so
/// a `WordId` identifies a word's spelling.
#[derive(Clone, Default)]
pub struct WordList {
    /// Every distinct character appearing in the list, indexed by `GlyphId`.
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,

    /// Reverse lookup for `glyphs`.
    pub glyph_id_by_char: HashMap<char, GlyphId>,

    /// Every word in the list, indexed by `WordId`, in the order they were first seen.
    pub words: Vec<Word>,

    /// Reverse lookup from normalized string to `WordId`.
    pub word_id_by_string: HashMap<String, WordId>,

    /// Lines that were skipped while loading.
    pub errors: Vec<WordListError>,
}

impl WordList {
    /// Build a word list from an iterator of raw words.
    #[must_use]
    pub fn from_words<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut word_list = WordList::default();
        for word in words {
            word_list.add_word(word.as_ref());
        }
        word_list
    }

    /// Build a word list from the contents of a word file, with one entry per line.
    #[must_use]
    pub fn from_file_contents(contents: &str) -> WordList {
        WordList::from_words(contents.lines())
    }

    /// Load a word list from a file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<WordList, WordListError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|_| WordListError::InvalidPath(path.display().to_string()))?;

        Ok(WordList::from_file_contents(&contents))
    }

    /// Look up the id for a char, registering it as a new glyph if we haven't seen it yet.
    pub fn glyph_id_for_char(&mut self, ch: char) -> GlyphId {
        if let Some(&glyph_id) = self.glyph_id_by_char.get(&ch) {
            return glyph_id;
        }
        self.glyphs.push(ch);
        let glyph_id = self.glyphs.len() - 1;
        self.glyph_id_by_char.insert(ch, glyph_id);
        glyph_id
    }

    /// Add a single raw entry to the list, returning its id. Blank entries are ignored, entries
    /// containing anything other than letters and digits are recorded in `errors`, and duplicates
    /// return the id of the existing word.
    pub fn add_word(&mut self, canonical: &str) -> Option<WordId> {
        let normalized_string = normalize_word(canonical);
        if normalized_string.is_empty() {
            return None;
        }

        if let Some(&word_id) = self.word_id_by_string.get(&normalized_string) {
            return Some(word_id);
        }

        if !normalized_string.chars().all(char::is_alphanumeric) {
            warn!("Skipping invalid word {canonical:?}");
            self.errors
                .push(WordListError::InvalidWord(canonical.trim().to_string()));
            return None;
        }

        let glyphs = normalized_string
            .chars()
            .map(|ch| self.glyph_id_for_char(ch))
            .collect();

        let word_id = self.words.len();
        self.words.push(Word {
            normalized_string: normalized_string.clone(),
            canonical_string: canonical.trim().to_string(),
            glyphs,
        });
        self.word_id_by_string.insert(normalized_string, word_id);

        Some(word_id)
    }

    /// Find the id of a word by its spelling, in any case.
    #[must_use]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_id_by_string.get(&normalize_word(word)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &format!("({} words)", self.words.len()))
            .field("errors", &self.errors)
            .finish()
    }
}
