/*!
 * Tests for the provider clients: request shapes, response parsing and
 * transport failures
 */

use std::time::Duration;
use serde_json::json;
use kanasub::errors::ProviderError;
use kanasub::providers::Provider;
use kanasub::providers::anthropic::{Anthropic, AnthropicRequest, AnthropicResponse};
use kanasub::providers::ollama::{GenerationRequest, GenerationResponse, Ollama};
use kanasub::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};

#[test]
fn test_ollama_new_withBareHost_shouldAddScheme() {
    let client = Ollama::new("localhost:11434/", Duration::from_secs(5));
    assert_eq!(client.base_url(), "http://localhost:11434");
}

#[test]
fn test_generation_request_withSystemAndTemperature_shouldSerializeNonStreaming() {
    let request = GenerationRequest::new("llama3.2:3b", "猫")
        .system("Translate")
        .temperature(0.3);
    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(value["model"], "llama3.2:3b");
    assert_eq!(value["prompt"], "猫");
    assert_eq!(value["system"], "Translate");
    assert_eq!(value["stream"], false);
    assert!(value["options"]["temperature"].is_number());
}

#[test]
fn test_ollama_extract_text_withResponse_shouldReturnGeneratedText() {
    let response: GenerationResponse = serde_json::from_value(json!({
        "model": "llama3.2:3b",
        "response": "Cat",
        "done": true
    })).unwrap();
    assert_eq!(Ollama::extract_text(&response), "Cat");
}

#[test]
fn test_openai_request_withMessages_shouldKeepOrder() {
    let request = OpenAIRequest::new("gpt-4o-mini")
        .add_message("system", "Translate")
        .add_message("user", "猫");
    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(value["messages"][0]["role"], "system");
    assert_eq!(value["messages"][1]["content"], "猫");
    assert!(value.get("temperature").is_none());
}

#[test]
fn test_openai_extract_text_withNoChoices_shouldBeEmpty() {
    let empty: OpenAIResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
    assert_eq!(OpenAI::extract_text(&empty), "");

    let answered: OpenAIResponse = serde_json::from_value(json!({
        "choices": [{ "message": { "role": "assistant", "content": "Dog" } }]
    })).unwrap();
    assert_eq!(OpenAI::extract_text(&answered), "Dog");
}

#[test]
fn test_anthropic_request_withSystem_shouldCarryMaxTokens() {
    let request = AnthropicRequest::new("claude-3-haiku-20240307", 1024)
        .system("Translate")
        .add_message("user", "猫");
    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(value["max_tokens"], 1024);
    assert_eq!(value["system"], "Translate");
    assert_eq!(value["messages"][0]["role"], "user");
}

#[test]
fn test_anthropic_extract_text_withMixedBlocks_shouldJoinTextOnly() {
    let response: AnthropicResponse = serde_json::from_value(json!({
        "content": [
            { "type": "text", "text": "It's " },
            { "type": "tool_use" },
            { "type": "text", "text": "a cat" }
        ]
    })).unwrap();
    assert_eq!(Anthropic::extract_text(&response), "It's a cat");
}

#[tokio::test]
async fn test_ollama_complete_withClosedPort_shouldReportConnectionError() {
    let client = Ollama::new("http://127.0.0.1:1", Duration::from_secs(5));
    let result = client.complete(GenerationRequest::new("llama3.2:3b", "猫")).await;
    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}
