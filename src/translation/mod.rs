/*!
 * Line translation for the translation block of a cue.
 *
 * - `core`: `TranslationService`, dispatching to the configured LLM backends
 * - `cache`: bounded cache of translated lines
 *
 * The markup assembler only depends on the `Translator` trait, so tests and
 * embedders can supply their own implementation.
 */

use async_trait::async_trait;

use crate::app_config::TranslationProvider;
use crate::errors::TranslationError;

pub use self::cache::{CacheStats, DEFAULT_MAX_ENTRIES, TranslationCache};
pub use self::core::TranslationService;

pub mod cache;
pub mod core;

/// Translates one line of text with a named backend
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_language` to `target_language` (ISO codes)
    async fn translate(
        &self,
        text: &str,
        service: &TranslationProvider,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError>;
}
