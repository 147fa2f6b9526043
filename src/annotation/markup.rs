/*!
 * Markup assembly.
 *
 * Builds the final text of one cue as SSA/ASS inline markup. Blocks are
 * emitted in a fixed order, each opened by a hard break and a font size
 * override:
 *
 * 1. translation, one translated line per source line, soft-break separated
 * 2. romaji for the whole cue
 * 3. for every source line, its furigana line followed by the line itself
 *
 * The whole cue is wrapped in a font family override. Doubled break markers
 * left behind by empty blocks are collapsed afterwards.
 */

use log::{error, trace, warn};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::sync::Arc;

use crate::annotation::placement;
use crate::annotation::reading::ReadingResolver;
use crate::app_config::TranslationProvider;
use crate::translation::Translator;

/// Line break that always starts a new line
pub const HARD_BREAK: &str = "\\N";

/// Line break that only applies under smart wrapping
pub const SOFT_BREAK: &str = "\\n";

static DOUBLED_HARD_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\\N){2,}").unwrap());
static DOUBLED_SOFT_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\\n){2,}").unwrap());

/// What to emit for a cue and how to style it
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupOptions {
    pub include_furigana: bool,
    pub include_romaji: bool,
    pub include_translation: bool,

    /// Size of the original text; sub-blocks are scaled from it
    pub base_font_size: u32,

    pub font_name: String,

    /// Backend used for the translation block
    pub translation_service: TranslationProvider,

    pub source_language: String,
    pub target_language: String,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            include_furigana: true,
            include_romaji: false,
            include_translation: false,
            base_font_size: 20,
            font_name: "Noto Sans JP".to_string(),
            translation_service: TranslationProvider::default(),
            source_language: "ja".to_string(),
            target_language: "en".to_string(),
        }
    }
}

/// Opening and closing markers of every block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupParts {
    pub start: String,
    pub translation_start: String,
    pub translation_newline: String,
    pub translation_end: String,
    pub romaji_start: String,
    pub romaji_end: String,
    pub furigana_start: String,
    pub furigana_end: String,
}

impl MarkupParts {
    pub fn from_options(options: &MarkupOptions) -> Self {
        let base = options.base_font_size;
        let two_thirds = base * 2 / 3;
        let half = base / 2;

        Self {
            start: font_open_tag(&options.font_name),
            translation_start: format!("{}{{\\fs{}}}", HARD_BREAK, two_thirds),
            translation_newline: SOFT_BREAK.to_string(),
            translation_end: HARD_BREAK.to_string(),
            romaji_start: format!("{}{{\\fs{}}}", HARD_BREAK, two_thirds),
            romaji_end: HARD_BREAK.to_string(),
            furigana_start: format!("{}{{\\fs{}}}", HARD_BREAK, half),
            furigana_end: format!("{}{{\\fs{}}}", HARD_BREAK, base),
        }
    }
}

/// Font family override that opens every cue
pub fn font_open_tag(font_name: &str) -> String {
    format!("{{\\fn{}}}", font_name)
}

/// Collapse runs of identical break markers into one and drop the hard break
/// directly after the opening `font_open` tag. Applying it twice changes nothing.
pub fn collapse_markers(text: &str, font_open: &str) -> String {
    let collapsed = DOUBLED_HARD_BREAKS.replace_all(text, NoExpand(HARD_BREAK));
    let collapsed = DOUBLED_SOFT_BREAKS.replace_all(&collapsed, NoExpand(SOFT_BREAK));

    match collapsed
        .strip_prefix(font_open)
        .and_then(|rest| rest.strip_prefix(HARD_BREAK))
    {
        Some(rest) => format!("{}{}", font_open, rest),
        None => collapsed.into_owned(),
    }
}

/// Split cue text on hard, soft and literal line breaks
pub fn split_lines(cue_text: &str) -> Vec<String> {
    cue_text
        .replace(HARD_BREAK, "\n")
        .replace(SOFT_BREAK, "\n")
        .replace("\r\n", "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}

/// Collapse the spacing left around the full-width line joiner in romaji
fn normalize_romaji(romaji: &str) -> String {
    romaji.replace(" \u{3000} ", "  ").replace("   ", "  ")
}

/// Assembles the annotated text of cues
#[derive(Clone)]
pub struct MarkupAssembler {
    resolver: ReadingResolver,
    translator: Option<Arc<dyn Translator>>,
}

impl std::fmt::Debug for MarkupAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupAssembler")
            .field("resolver", &self.resolver)
            .field("translator", &self.translator.is_some())
            .finish()
    }
}

impl MarkupAssembler {
    pub fn new(resolver: ReadingResolver, translator: Option<Arc<dyn Translator>>) -> Self {
        Self { resolver, translator }
    }

    /// Build the marked-up text for one cue
    pub async fn assemble(&self, cue_text: &str, options: &MarkupOptions) -> String {
        let lines = split_lines(cue_text);
        // One shared map and romaji sequence for all lines of the cue
        let resolution = self.resolver.resolve_lines(&lines);
        let parts = MarkupParts::from_options(options);

        let mut markup = parts.start.clone();

        if options.include_translation {
            markup.push_str(&parts.translation_start);
            for (i, line) in lines.iter().enumerate() {
                markup.push_str(&self.translate_line(line, options).await);
                if i + 1 != lines.len() {
                    markup.push_str(&parts.translation_newline);
                }
            }
            markup.push_str(&parts.translation_end);
        }

        if options.include_romaji {
            markup.push_str(&parts.romaji_start);
            markup.push_str(&normalize_romaji(&resolution.romaji.join(" ")));
            markup.push_str(&parts.romaji_end);
        }

        if options.include_furigana {
            for line in &lines {
                markup.push_str(&parts.furigana_start);
                markup.push_str(&placement::place(line, &resolution.readings));
                markup.push_str(&parts.furigana_end);
                markup.push_str(line);
            }
        }

        let markup = collapse_markers(&markup, &parts.start);
        trace!("Assembled cue: {}", markup);
        markup
    }

    /// Translation of one line; empty on failure or for empty lines
    async fn translate_line(&self, line: &str, options: &MarkupOptions) -> String {
        if line.is_empty() {
            return String::new();
        }

        let Some(translator) = &self.translator else {
            warn!("Translation requested but no translator is configured");
            return String::new();
        };

        match translator
            .translate(
                line,
                &options.translation_service,
                &options.source_language,
                &options.target_language,
            )
            .await
        {
            Ok(translation) => translation
                .trim()
                .replace("\r\n", "\n")
                .replace('\n', SOFT_BREAK),
            Err(e) => {
                error!("Failed to translate '{}': {}", line, e);
                String::new()
            }
        }
    }
}
