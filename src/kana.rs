/*!
 * Kana script conversions.
 *
 * Conversions between the Japanese syllabic scripts and a Hepburn-style
 * romanization:
 * - katakana <-> hiragana
 * - katakana -> romaji
 * - romaji -> hiragana (fallback used when the tokenizer supplies no reading)
 *
 * Romanization is delegated to `wana_kana`. Half-width katakana is widened
 * before any conversion. Characters outside the handled ranges are passed
 * through unchanged.
 */

use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;
use wana_kana::ConvertJapanese;

/// Offset between a katakana code point and its hiragana counterpart
const KATAKANA_HIRAGANA_OFFSET: u32 = 0x60;

/// Prolonged sound mark, shared by both kana scripts
pub const PROLONGED_SOUND_MARK: char = 'ー';

/// Romanization of a small tsu with no consonant after it to double
pub const LONE_SOKUON_ROMAJI: char = '\'';

// Consonants a preceding small tsu doubles in Hepburn ("c" covers "tch")
const GEMINATE_CONSONANTS: &str = "bcdfghjkmpqrstvwxz";

/// Character classes relevant to segmentation and annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Hiragana,
    Katakana,
    Kanji,
    /// ASCII or full-width letters and digits
    Alphanumeric,
    Whitespace,
    Other,
}

/// Classify a single character by script
pub fn classify(c: char) -> CharClass {
    match c as u32 {
        0x3041..=0x309F => CharClass::Hiragana,
        0x30A0..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9F => CharClass::Katakana,
        0x3005 | 0x3006 | 0x3007 | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF => CharClass::Kanji,
        0xFF10..=0xFF19 | 0xFF21..=0xFF3A | 0xFF41..=0xFF5A => CharClass::Alphanumeric,
        _ if c.is_whitespace() => CharClass::Whitespace,
        _ if c.is_ascii_alphanumeric() => CharClass::Alphanumeric,
        _ => CharClass::Other,
    }
}

/// True when every character is hiragana or katakana (the prolonged sound mark included)
pub fn is_kana(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| matches!(classify(c), CharClass::Hiragana | CharClass::Katakana))
}

fn is_halfwidth_katakana(c: char) -> bool {
    matches!(c as u32, 0xFF61..=0xFF9F)
}

/// Replace half-width katakana (and its punctuation) with the full-width
/// forms, folding the separate voicing marks into the preceding kana
pub fn widen_halfwidth_katakana(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_halfwidth_katakana) {
        return Cow::Borrowed(text);
    }

    let mut widened = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if is_halfwidth_katakana(c) {
            run.push(c);
            continue;
        }
        if !run.is_empty() {
            widened.extend(run.as_str().nfkc());
            run.clear();
        }
        widened.push(c);
    }
    widened.extend(run.as_str().nfkc());
    Cow::Owned(widened)
}

/// Convert katakana to hiragana, leaving every other character untouched
pub fn katakana_to_hiragana(text: &str) -> String {
    widen_halfwidth_katakana(text)
        .chars()
        .map(|c| match c as u32 {
            0x30A1..=0x30F6 | 0x30FD..=0x30FE => {
                char::from_u32(c as u32 - KATAKANA_HIRAGANA_OFFSET).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

/// Convert hiragana to katakana, leaving every other character untouched
pub fn hiragana_to_katakana(text: &str) -> String {
    widen_halfwidth_katakana(text)
        .chars()
        .map(|c| match c as u32 {
            0x3041..=0x3096 | 0x309D..=0x309E => {
                char::from_u32(c as u32 + KATAKANA_HIRAGANA_OFFSET).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

fn is_sokuon(c: char) -> bool {
    matches!(c, 'ッ' | 'っ')
}

/// True when a small tsu before `next` turns into a doubled consonant
fn doubles_next(next: Option<char>) -> bool {
    next.filter(|c| matches!(classify(*c), CharClass::Hiragana | CharClass::Katakana) && !is_sokuon(*c))
        .and_then(|c| c.to_string().to_romaji().chars().next())
        .is_some_and(|first| GEMINATE_CONSONANTS.contains(first))
}

/// Romanize katakana (Hepburn). Hiragana is accepted too; unknown characters
/// are copied as-is. A small tsu that has no consonant to double is written
/// as an apostrophe rather than dropped.
pub fn katakana_to_romaji(text: &str) -> String {
    let widened = widen_halfwidth_katakana(text);
    let chars: Vec<char> = widened.chars().collect();
    let mut output = String::with_capacity(widened.len() * 2);
    let mut segment = String::new();

    for (i, c) in chars.iter().enumerate() {
        if is_sokuon(*c) && !doubles_next(chars.get(i + 1).copied()) {
            output.push_str(&segment.to_romaji());
            output.push(LONE_SOKUON_ROMAJI);
            segment.clear();
        } else {
            segment.push(*c);
        }
    }
    output.push_str(&segment.to_romaji());

    output
}

/// Convert romaji to hiragana. Text that is not romaji passes through, so a
/// partially converted result is possible (e.g. "abc" -> "あbc").
pub fn alphabet_to_hiragana(text: &str) -> String {
    widen_halfwidth_katakana(text).to_lowercase().to_hiragana()
}
