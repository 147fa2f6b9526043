/*!
 * Furigana placement.
 *
 * Builds the annotation line rendered directly above a subtitle line. Each
 * reading is preceded by enough full-width filler spaces that its visible
 * center lands near the center of the text span it glosses, assuming every
 * character of the line occupies one full-width cell.
 *
 * Half-width characters (ASCII punctuation, Latin letters) are still counted
 * as full cells, so spacing around them is approximate.
 */

use crate::annotation::reading::ReadingMap;

/// Filler character; one filler is half a cell of the (larger) base text
pub const FILLER: char = '\u{3000}';

/// Each neighboring reading eats `len / READING_WIDTH_DIVISOR` cells of the gap
pub const READING_WIDTH_DIVISOR: f64 = 4.0;

/// Fillers emitted per cell of adjusted gap
pub const FILLERS_PER_CELL: f64 = 2.0;

/// Where a reading-map key was found in a line, in character indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub start: usize,
    pub end: usize,
    pub reading: String,
}

impl Occurrence {
    pub fn new(start: usize, end: usize, reading: impl Into<String>) -> Self {
        Self {
            start,
            end,
            reading: reading.into(),
        }
    }

    /// Zero-width anchor with no reading
    fn sentinel(at: usize) -> Self {
        Self::new(at, at, String::new())
    }

    fn midpoint(&self) -> f64 {
        (self.start + self.end) as f64 / 2.0
    }

    fn reading_len(&self) -> f64 {
        self.reading.chars().count() as f64
    }
}

/// Find every non-overlapping occurrence of every key of `readings` in
/// `line`, ordered by start index. Occurrences of different keys are not
/// checked against each other; ties keep map order.
pub fn find_occurrences(line: &str, readings: &ReadingMap) -> Vec<Occurrence> {
    let chars: Vec<char> = line.chars().collect();
    let mut occurrences = Vec::new();

    for (surface, reading) in readings.iter() {
        let key: Vec<char> = surface.chars().collect();
        if key.is_empty() || key.len() > chars.len() {
            continue;
        }

        let mut i = 0;
        while i + key.len() <= chars.len() {
            if chars[i..i + key.len()] == key[..] {
                occurrences.push(Occurrence::new(i, i + key.len(), reading));
                i += key.len();
            } else {
                i += 1;
            }
        }
    }

    // Stable: equal starts stay in map order
    occurrences.sort_by_key(|occurrence| occurrence.start);
    occurrences
}

/// Number of fillers to emit between the readings of `prev` and `current`.
/// The fractional part is truncated and negative gaps produce no filler.
pub fn filler_count(prev: &Occurrence, current: &Occurrence) -> usize {
    let midpoint_gap = current.midpoint() - prev.midpoint();
    let adjusted_gap = midpoint_gap
        - prev.reading_len() / READING_WIDTH_DIVISOR
        - current.reading_len() / READING_WIDTH_DIVISOR;
    let fillers = (adjusted_gap * FILLERS_PER_CELL).floor();
    if fillers > 0.0 { fillers as usize } else { 0 }
}

/// Build the furigana line for `line`. Empty when no key occurs in the line.
pub fn place(line: &str, readings: &ReadingMap) -> String {
    let occurrences = find_occurrences(line, readings);
    if occurrences.is_empty() {
        return String::new();
    }

    let line_len = line.chars().count();
    let mut anchors = Vec::with_capacity(occurrences.len() + 2);
    anchors.push(Occurrence::sentinel(0));
    anchors.extend(occurrences);
    anchors.push(Occurrence::sentinel(line_len));

    let mut annotation = String::new();
    for pair in anchors.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);
        annotation.extend(std::iter::repeat_n(FILLER, filler_count(prev, current)));
        annotation.push_str(&current.reading);
    }
    annotation
}
