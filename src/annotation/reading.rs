/*!
 * Reading resolution.
 *
 * Turns a line of text into the mapping of written forms to hiragana
 * readings used for furigana, plus the romanized token sequence for the
 * whole line.
 */

use log::{debug, trace};
use std::sync::Arc;

use crate::kana;
use crate::tokenizer::Tokenizer;

/// Separator used when several subtitle lines are resolved as one text
pub const LINE_JOINER: &str = "\u{3000}";

/// Written form -> hiragana reading, only for forms that are not already kana.
///
/// Keeps first-insertion order so that every consumer sees the same ordering
/// for the same input; a repeated key keeps its position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingMap {
    entries: Vec<(String, String)>,
}

impl ReadingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the reading for `surface`
    pub fn insert(&mut self, surface: impl Into<String>, reading: impl Into<String>) {
        let surface = surface.into();
        let reading = reading.into();
        match self.entries.iter_mut().find(|(key, _)| *key == surface) {
            Some(entry) => entry.1 = reading,
            None => self.entries.push((surface, reading)),
        }
    }

    pub fn get(&self, surface: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == surface)
            .map(|(_, reading)| reading.as_str())
    }

    pub fn contains_key(&self, surface: &str) -> bool {
        self.get(surface).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(surface, reading)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<S: Into<String>, R: Into<String>> FromIterator<(S, R)> for ReadingMap {
    fn from_iter<I: IntoIterator<Item = (S, R)>>(iter: I) -> Self {
        let mut map = ReadingMap::new();
        for (surface, reading) in iter {
            map.insert(surface, reading);
        }
        map
    }
}

/// Result of resolving one text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Furigana readings for the non-kana forms of the text
    pub readings: ReadingMap,

    /// One romanized token per tokenizer token, in order
    pub romaji: Vec<String>,
}

/// Resolves readings with an injected, reusable tokenizer
#[derive(Debug, Clone)]
pub struct ReadingResolver {
    tokenizer: Arc<dyn Tokenizer>,
}

impl ReadingResolver {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// Resolve several subtitle lines as a single text joined by `LINE_JOINER`
    pub fn resolve_lines<S: AsRef<str>>(&self, lines: &[S]) -> Resolution {
        let joined = lines
            .iter()
            .map(|line| line.as_ref())
            .collect::<Vec<_>>()
            .join(LINE_JOINER);
        self.resolve(&joined)
    }

    /// Resolve the readings of `text`
    pub fn resolve(&self, text: &str) -> Resolution {
        let mut resolution = Resolution::default();

        for token in self.tokenizer.tokenize(text) {
            if token.surface.is_empty() {
                trace!("Skipping empty token");
                continue;
            }

            // Oracle reading when usable, otherwise the romaji->kana fallback
            let (reading, from_oracle) = match token.reading.as_deref() {
                Some(reading) if kana::is_kana(reading) => {
                    (kana::hiragana_to_katakana(reading), true)
                }
                _ => (
                    kana::hiragana_to_katakana(&kana::alphabet_to_hiragana(&token.surface)),
                    false,
                ),
            };

            let reading_hiragana = kana::katakana_to_hiragana(&reading);
            let surface_hiragana = kana::katakana_to_hiragana(&token.surface);

            if surface_hiragana != reading_hiragana {
                if kana::is_kana(&reading_hiragana) {
                    resolution
                        .readings
                        .insert(token.surface.clone(), reading_hiragana);
                } else {
                    debug!(
                        "No usable reading for '{}' ({})",
                        token.surface,
                        if from_oracle { "tokenizer" } else { "fallback" }
                    );
                }
            }

            resolution.romaji.push(kana::katakana_to_romaji(&reading));
        }

        resolution
    }
}
