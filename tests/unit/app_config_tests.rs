/*!
 * Tests for application configuration
 */

use std::str::FromStr;
use kanasub::app_config::{Config, LogLevel, TranslationProvider};
use kanasub::subtitle_processor::TextEncoding;

#[test]
fn test_default_config_shouldEnableOnlyFurigana() {
    let config = Config::default();
    assert_eq!(config.source_language, "ja");
    assert_eq!(config.target_language, "en");
    assert!(config.markup.furigana);
    assert!(!config.markup.romaji);
    assert!(!config.markup.translation);
    assert_eq!(config.markup.base_font_size, 20);
    assert_eq!(config.output.encoding, TextEncoding::Utf8);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_deserialize_withEmptyObject_shouldUseDefaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config.markup.font_name, "Noto Sans JP");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.available_providers.len(), 4);
    assert!(config.translation.common.cache_enabled);
}

#[test]
fn test_deserialize_withPartialSections_shouldFillMissingFields() {
    let json = r#"{
        "markup": { "romaji": true, "base_font_size": 24 },
        "output": { "encoding": "utf-16le", "extension": "ass" },
        "log_level": "debug"
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert!(config.markup.furigana);
    assert!(config.markup.romaji);
    assert_eq!(config.markup.base_font_size, 24);
    assert_eq!(config.output.encoding, TextEncoding::Utf16Le);
    assert_eq!(config.output.extension.as_deref(), Some("ass"));
    assert_eq!(config.log_level, LogLevel::Debug);
}

#[test]
fn test_serialize_withDefaults_shouldRoundTrip() {
    let json = serde_json::to_string_pretty(&Config::default()).unwrap();
    let config: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(config.translation.get_model(), "llama3.2:3b");
    assert_eq!(config.target_language, "en");
}

#[test]
fn test_validate_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    config.markup.base_font_size = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.source_language = "zz".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.markup.font_name = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withHostedProviderWithoutKey_shouldRequireKeyOnlyWhenTranslating() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;
    assert!(config.validate().is_ok());

    config.markup.translation = true;
    assert!(config.validate().is_err());

    config.translation.available_providers[1].api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_translation_provider_withNames_shouldParseAndDisplay() {
    assert_eq!(TranslationProvider::from_str("LMStudio").unwrap(), TranslationProvider::LMStudio);
    assert_eq!(TranslationProvider::Anthropic.to_string(), "anthropic");
    assert_eq!(TranslationProvider::LMStudio.display_name(), "LM Studio");
    assert!(TranslationProvider::from_str("deepl").is_err());
    assert!(TranslationProvider::OpenAI.requires_api_key());
    assert!(!TranslationProvider::Ollama.requires_api_key());
}

#[test]
fn test_endpoint_for_withEmptyEndpoint_shouldFallBackToDefault() {
    let mut config = Config::default();
    config.translation.available_providers[0].endpoint.clear();
    assert_eq!(config.translation.endpoint_for(&TranslationProvider::Ollama), "http://localhost:11434");

    config.translation.available_providers[0].endpoint = "http://gpu-box:11434".to_string();
    assert_eq!(config.translation.endpoint_for(&TranslationProvider::Ollama), "http://gpu-box:11434");
    assert_eq!(config.translation.model_for(&TranslationProvider::Anthropic), "claude-3-haiku-20240307");
}
