/*!
 * Furigana, romaji and translation annotation of subtitle text.
 *
 * - `reading`: resolves written forms to readings through a `Tokenizer`
 * - `placement`: lays out a furigana line so each reading sits over its span
 * - `markup`: assembles the styled cue text from the blocks above
 */

pub use self::markup::{MarkupAssembler, MarkupOptions, MarkupParts, collapse_markers};
pub use self::placement::{Occurrence, find_occurrences, place};
pub use self::reading::{ReadingMap, ReadingResolver, Resolution};

pub mod markup;
pub mod placement;
pub mod reading;
