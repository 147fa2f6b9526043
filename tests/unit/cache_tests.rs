/*!
 * Tests for the translation cache
 */

use kanasub::app_config::TranslationProvider;
use kanasub::translation::TranslationCache;

const OLLAMA: TranslationProvider = TranslationProvider::Ollama;

#[test]
fn test_get_withStoredTranslation_shouldHit() {
    let cache = TranslationCache::new(true);
    cache.store("猫", &OLLAMA, "ja", "en", "Cat");

    assert_eq!(cache.get("猫", &OLLAMA, "ja", "en").as_deref(), Some("Cat"));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn test_get_withDifferentServiceOrLanguage_shouldMiss() {
    let cache = TranslationCache::new(true);
    cache.store("猫", &OLLAMA, "ja", "en", "Cat");

    assert!(cache.get("猫", &TranslationProvider::OpenAI, "ja", "en").is_none());
    assert!(cache.get("猫", &OLLAMA, "ja", "fr").is_none());
    assert_eq!(cache.stats().misses, 2);
    assert_eq!(cache.stats().hit_rate(), 0.0);
}

#[test]
fn test_store_withDisabledCache_shouldKeepNothing() {
    let cache = TranslationCache::new(false);
    cache.store("猫", &OLLAMA, "ja", "en", "Cat");

    assert!(cache.is_empty());
    assert!(!cache.is_enabled());
    assert!(cache.get("猫", &OLLAMA, "ja", "en").is_none());
}

#[test]
fn test_clone_withSharedStorage_shouldSeeEntries() {
    let cache = TranslationCache::default();
    let clone = cache.clone();
    clone.store("犬", &OLLAMA, "ja", "en", "Dog");

    assert_eq!(cache.get("犬", &OLLAMA, "ja", "en").as_deref(), Some("Dog"));
    assert!((cache.stats().hit_rate() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_clear_withEntries_shouldResetEntriesAndStats() {
    let cache = TranslationCache::new(true);
    cache.store("猫", &OLLAMA, "ja", "en", "Cat");
    cache.get("猫", &OLLAMA, "ja", "en");

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().hits, 0);
}

#[test]
fn test_store_withFullCache_shouldEvictOldestEntry() {
    let cache = TranslationCache::with_max_entries(true, 2);
    cache.store("猫", &OLLAMA, "ja", "en", "Cat");
    cache.store("犬", &OLLAMA, "ja", "en", "Dog");
    cache.store("猫", &OLLAMA, "ja", "en", "Kitty");
    cache.store("鳥", &OLLAMA, "ja", "en", "Bird");

    assert_eq!(cache.len(), 2);
    assert!(cache.get("猫", &OLLAMA, "ja", "en").is_none());
    assert_eq!(cache.get("犬", &OLLAMA, "ja", "en").as_deref(), Some("Dog"));
    assert_eq!(cache.get("鳥", &OLLAMA, "ja", "en").as_deref(), Some("Bird"));
}

#[test]
fn test_store_withManyLines_shouldNeverExceedLimit() {
    let cache = TranslationCache::with_max_entries(true, 16);
    for i in 0..100 {
        cache.store(&format!("行{}", i), &OLLAMA, "ja", "en", "line");
        assert!(cache.len() <= 16);
    }
    assert_eq!(cache.len(), 16);
    assert_eq!(cache.max_entries(), 16);
    assert_eq!(TranslationCache::new(true).max_entries(), kanasub::translation::DEFAULT_MAX_ENTRIES);
}
