/*!
 * Tokenization oracle.
 *
 * The `Tokenizer` trait is the single capability the reading resolver needs:
 * segment text into surface forms, each optionally carrying a katakana
 * reading. Two implementations are provided:
 * - `MorphologicalTokenizer`: morphological analysis over the embedded IPADIC
 *   dictionary, optionally overlaid with a user lexicon
 * - `LexiconTokenizer`: a longest-match segmenter over a user supplied
 *   reading lexicon alone
 */

use anyhow::{Context, Result, anyhow};
use lindera_core::mode::Mode;
use lindera_dictionary::{DictionaryConfig, DictionaryKind};
use lindera_tokenizer::tokenizer::{Tokenizer as AnalyzerTokenizer, TokenizerConfig};
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::path::Path;

use crate::kana::{self, CharClass};

/// A minimal segmentation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Text as written
    pub surface: String,

    /// Phonetic reading in katakana, when the tokenizer knows one
    pub reading: Option<String>,
}

impl Token {
    pub fn new(surface: impl Into<String>, reading: Option<String>) -> Self {
        Self {
            surface: surface.into(),
            reading,
        }
    }
}

/// Segments text into surface/reading pairs
pub trait Tokenizer: Send + Sync + Debug {
    /// Split `text` into tokens, in order, covering the whole input
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Longest-match tokenizer backed by a surface -> reading lexicon
#[derive(Debug, Clone, Default)]
pub struct LexiconTokenizer {
    // @field: Surface form -> katakana reading
    entries: HashMap<String, String>,

    // @field: Longest surface form, in characters
    max_surface_chars: usize,
}

impl LexiconTokenizer {
    /// Create an empty lexicon tokenizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tokenizer from `(surface, reading)` pairs
    pub fn from_entries<I, S, R>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, R)>,
        S: Into<String>,
        R: Into<String>,
    {
        let mut tokenizer = Self::new();
        for (surface, reading) in entries {
            tokenizer.insert(surface, reading);
        }
        tokenizer
    }

    /// Add or replace a lexicon entry. Readings are stored as katakana.
    pub fn insert(&mut self, surface: impl Into<String>, reading: impl Into<String>) {
        let surface = surface.into();
        if surface.is_empty() {
            return;
        }
        self.max_surface_chars = self.max_surface_chars.max(surface.chars().count());
        self.entries
            .insert(surface, kana::hiragana_to_katakana(&reading.into()));
    }

    /// Parse a tab-separated lexicon: one `surface<TAB>reading` pair per line,
    /// blank lines and `#` comments ignored, malformed lines skipped.
    pub fn from_tsv_str(content: &str) -> Self {
        let mut tokenizer = Self::new();
        for (line_number, line) in content.lines().enumerate() {
            let trimmed = line.trim_end_matches('\r');
            if trimmed.trim().is_empty() || trimmed.trim_start().starts_with('#') {
                continue;
            }
            match trimmed.split_once('\t') {
                Some((surface, reading)) if !surface.trim().is_empty() && !reading.trim().is_empty() => {
                    tokenizer.insert(surface.trim(), reading.trim());
                }
                _ => warn!("Skipping malformed lexicon line {}: {}", line_number + 1, trimmed),
            }
        }
        tokenizer
    }

    /// Load a lexicon file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon: {:?}", path))?;
        let tokenizer = Self::from_tsv_str(&content);
        debug!("Loaded {} lexicon entries from {:?}", tokenizer.len(), path);
        Ok(tokenizer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Longest lexicon entry starting at `start`, as (length in chars, reading)
    fn longest_match(&self, chars: &[char], start: usize) -> Option<(usize, &str)> {
        let longest = self.max_surface_chars.min(chars.len() - start);
        (1..=longest).rev().find_map(|len| {
            let candidate: String = chars[start..start + len].iter().collect();
            self.entries
                .get(&candidate)
                .map(|reading| (len, reading.as_str()))
        })
    }

    /// Length of the unknown run starting at `start`: same script class, ending
    /// where a lexicon entry begins. Punctuation is always a single character.
    fn unknown_run_len(&self, chars: &[char], start: usize) -> usize {
        let class = kana::classify(chars[start]);
        if class == CharClass::Other {
            return 1;
        }
        let mut end = start + 1;
        while end < chars.len()
            && kana::classify(chars[end]) == class
            && self.longest_match(chars, end).is_none()
        {
            end += 1;
        }
        end - start
    }
}

impl Tokenizer for LexiconTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if let Some((len, reading)) = self.longest_match(&chars, i) {
                let surface: String = chars[i..i + len].iter().collect();
                tokens.push(Token::new(surface, Some(reading.to_string())));
                i += len;
                continue;
            }

            let len = self.unknown_run_len(&chars, i);
            let surface: String = chars[i..i + len].iter().collect();
            // Kana reads as itself; anything else is left to the caller's fallback
            let reading = kana::is_kana(&surface).then(|| kana::hiragana_to_katakana(&surface));
            tokens.push(Token::new(surface, reading));
            i += len;
        }

        tokens
    }
}

// IPADIC feature columns; the reading is the eighth, "*" when unknown
const IPADIC_READING_COLUMN: usize = 7;
const IPADIC_UNKNOWN_FIELD: &str = "*";

/// Tokenizer backed by morphological analysis over the embedded IPADIC
/// dictionary. Entries of an optional user lexicon take precedence: text is
/// first split on lexicon matches and only the gaps go to the analyzer.
pub struct MorphologicalTokenizer {
    analyzer: AnalyzerTokenizer,
    overlay: Option<LexiconTokenizer>,
}

impl MorphologicalTokenizer {
    /// Load the embedded dictionary
    pub fn new() -> Result<Self> {
        let config = TokenizerConfig {
            dictionary: DictionaryConfig {
                kind: Some(DictionaryKind::IPADIC),
                path: None,
            },
            user_dictionary: None,
            mode: Mode::Normal,
        };
        let analyzer = AnalyzerTokenizer::from_config(config)
            .map_err(|e| anyhow!("Failed to load the IPADIC dictionary: {}", e))?;
        debug!("Loaded embedded IPADIC dictionary");

        Ok(Self {
            analyzer,
            overlay: None,
        })
    }

    /// Let `lexicon` entries override the analyzer's segmentation and readings
    pub fn with_overlay(mut self, lexicon: LexiconTokenizer) -> Self {
        self.overlay = (!lexicon.is_empty()).then_some(lexicon);
        self
    }

    fn analyze(&self, text: &str, tokens: &mut Vec<Token>) {
        if text.is_empty() {
            return;
        }

        let mut analyzed = match self.analyzer.tokenize(text) {
            Ok(analyzed) => analyzed,
            Err(e) => {
                warn!("Morphological analysis failed for {:?}: {}", text, e);
                tokens.push(Token::new(text, None));
                return;
            }
        };

        for token in analyzed.iter_mut() {
            let surface = token.text.to_string();
            let reading = token
                .get_details()
                .and_then(|details| details.get(IPADIC_READING_COLUMN).map(|r| r.to_string()))
                .filter(|r| r != IPADIC_UNKNOWN_FIELD && kana::is_kana(r))
                .or_else(|| kana::is_kana(&surface).then(|| kana::hiragana_to_katakana(&surface)));
            tokens.push(Token::new(surface, reading));
        }
    }
}

impl Debug for MorphologicalTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MorphologicalTokenizer")
            .field("dictionary", &"IPADIC")
            .field("overlay_entries", &self.overlay.as_ref().map_or(0, LexiconTokenizer::len))
            .finish()
    }
}

impl Tokenizer for MorphologicalTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let Some(overlay) = &self.overlay else {
            self.analyze(text, &mut tokens);
            return tokens;
        };

        let chars: Vec<char> = text.chars().collect();
        let mut gap = String::new();
        let mut i = 0;
        while i < chars.len() {
            match overlay.longest_match(&chars, i) {
                Some((len, reading)) => {
                    self.analyze(&gap, &mut tokens);
                    gap.clear();
                    let surface: String = chars[i..i + len].iter().collect();
                    tokens.push(Token::new(surface, Some(reading.to_string())));
                    i += len;
                }
                None => {
                    gap.push(chars[i]);
                    i += 1;
                }
            }
        }
        self.analyze(&gap, &mut tokens);

        tokens
    }
}
