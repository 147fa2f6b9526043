/*!
 * Translation caching functionality.
 * 
 * Subtitle tracks repeat lines often (greetings, names, songs). The cache
 * keeps each translated line so identical lines are only sent to a backend
 * once. The cache is bounded: once full, the oldest entry is evicted first.
 */

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use parking_lot::RwLock;
use log::debug;

use crate::app_config::TranslationProvider;

/// Cache key: source text, backend and language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source_text: String,
    service: String,
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, service: &TranslationProvider, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            service: service.to_lowercase_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Entry limit of a cache built with `TranslationCache::new`
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Entries plus their insertion order, for eviction
#[derive(Debug, Default)]
struct CacheEntries {
    translations: HashMap<CacheKey, String>,
    order: VecDeque<CacheKey>,
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Translation cache for storing and retrieving translations
#[derive(Debug, Clone)]
pub struct TranslationCache {
    /// Internal cache storage, shared between clones
    cache: Arc<RwLock<CacheEntries>>,
    
    stats: Arc<RwLock<CacheStats>>,
    
    /// Whether caching is enabled
    enabled: bool,
    
    /// Entries kept before the oldest is evicted
    max_entries: usize,
}

impl TranslationCache {
    /// Create a new translation cache holding up to `DEFAULT_MAX_ENTRIES`
    pub fn new(enabled: bool) -> Self {
        Self::with_max_entries(enabled, DEFAULT_MAX_ENTRIES)
    }
    
    /// Create a translation cache holding at most `max_entries` (at least one)
    pub fn with_max_entries(enabled: bool, max_entries: usize) -> Self {
        Self {
            cache: Arc::new(RwLock::new(CacheEntries::default())),
            stats: Arc::new(RwLock::new(CacheStats::default())),
            enabled,
            max_entries: max_entries.max(1),
        }
    }
    
    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, service: &TranslationProvider, source_language: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        
        let key = CacheKey::new(source_text, service, source_language, target_language);
        let found = self.cache.read().translations.get(&key).cloned();
        
        let mut stats = self.stats.write();
        match found {
            Some(translation) => {
                stats.hits += 1;
                debug!("Cache hit for '{}' ({} -> {})", 
                       truncate_text(source_text, 30), 
                       source_language, 
                       target_language);
                Some(translation)
            },
            None => {
                stats.misses += 1;
                None
            }
        }
    }
    
    /// Store a translation in the cache
    pub fn store(&self, source_text: &str, service: &TranslationProvider, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }
        
        let key = CacheKey::new(source_text, service, source_language, target_language);
        let mut entries = self.cache.write();
        if entries.translations.insert(key.clone(), translation.to_string()).is_some() {
            return;
        }
        entries.order.push_back(key);
        
        while entries.translations.len() > self.max_entries {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.translations.remove(&oldest);
            debug!("Evicted '{}' from the translation cache", truncate_text(&oldest.source_text, 30));
        }
    }
    
    /// Current hit/miss counters
    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }
    
    /// Clear the cache and its counters
    pub fn clear(&self) {
        let mut entries = self.cache.write();
        entries.translations.clear();
        entries.order.clear();
        drop(entries);
        *self.stats.write() = CacheStats::default();
        debug!("Translation cache cleared");
    }
    
    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().translations.len()
    }
    
    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().translations.is_empty()
    }
    
    /// Entries kept before the oldest is evicted
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
    
    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Truncate text to at most `max_chars` characters, with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
