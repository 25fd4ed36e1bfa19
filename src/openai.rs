use crate::config::Config;
use crate::i18n::Language;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const FALLBACK_REPLY: &str = "I apologize, but I couldn't generate a response.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// One learner turn for the chat partner.
#[derive(Debug, Clone)]
pub struct ChatTurn<'a> {
    pub message: &'a str,
    /// Registry id, ISO code, or free text
    pub language: &'a str,
    pub difficulty: Option<&'a str>,
    pub show_grammar_correction: bool,
}

/// Style directive for a difficulty level; unknown values get beginner's.
fn difficulty_directive(difficulty: Option<&str>) -> &'static str {
    match difficulty.map(str::trim) {
        Some("intermediate") => {
            "Use more complex vocabulary and grammar structures. Provide more detailed responses."
        }
        Some("advanced") => {
            "Use advanced vocabulary and complex grammar structures. Engage in deeper conversations."
        }
        _ => "Use simple vocabulary and basic grammar structures. Keep responses short and clear.",
    }
}

/// Build the system prompt for the chat partner
pub fn build_system_prompt(turn: &ChatTurn<'_>) -> String {
    let language_name = Language::resolve(turn.language)
        .map(|language| language.name())
        .unwrap_or(turn.language);

    let mut lines = vec![
        "You are a helpful language learning assistant.".to_string(),
        format!("Respond in {}.", language_name),
        difficulty_directive(turn.difficulty).to_string(),
    ];
    if turn.show_grammar_correction {
        lines.push(
            "If the user makes grammar mistakes, provide corrections in a friendly way.".to_string(),
        );
    }
    lines.push("Keep responses natural and conversational.".to_string());

    lines.join("\n")
}

/// Get the chat partner's reply to one learner message
pub async fn chat_reply(client: &reqwest::Client, config: &Config, turn: &ChatTurn<'_>) -> Result<String> {
    let api_key = config
        .openai_api_key
        .as_deref()
        .context("OpenAI API key is not configured")?;

    let request = ChatRequest {
        model: config.openai_model.clone(),
        messages: vec![
            Message {
                role: "system".to_string(),
                content: build_system_prompt(turn),
            },
            Message {
                role: "user".to_string(),
                content: turn.message.to_string(),
            },
        ],
        max_tokens: 500,
        temperature: 0.7,
    };

    let response = client
        .post(&config.openai_api_url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await
        .context("Failed to send request to OpenAI API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        anyhow::bail!("OpenAI API error ({}): {}", status, body);
    }

    let chat_response: ChatResponse = response
        .json()
        .await
        .context("Failed to parse OpenAI response")?;

    let reply = chat_response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    /// Create a test config pointing the chat API at a mock server
    fn create_test_config(api_url: &str) -> Config {
        Config {
            openai_api_key: Some("test-openai-key".to_string()),
            openai_model: "gpt-3.5-turbo".to_string(),
            openai_api_url: api_url.to_string(),
            google_translate_api_key: None,
            google_translate_api_url: "http://unused".to_string(),
            libretranslate_url: None,
            libretranslate_api_key: None,
            translate_timeout: Duration::from_secs(5),
            session_ttl: Duration::from_secs(3600),
            max_sessions: 100,
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }

    fn turn<'a>(message: &'a str, language: &'a str) -> ChatTurn<'a> {
        ChatTurn {
            message,
            language,
            difficulty: None,
            show_grammar_correction: false,
        }
    }

    /// Create a mock OpenAI success response
    fn create_openai_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-3.5-turbo",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": content
                    },
                    "finish_reason": "stop"
                }
            ]
        })
    }

    // ==================== Prompt Tests ====================

    #[test]
    fn test_system_prompt_resolves_language_name() {
        let prompt = build_system_prompt(&turn("Olá", "lang_pt"));

        assert!(prompt.contains("Respond in Portuguese."));
        assert!(prompt.contains("simple vocabulary"));
        assert!(prompt.ends_with("Keep responses natural and conversational."));
        assert!(!prompt.contains("grammar mistakes"));
    }

    #[test]
    fn test_system_prompt_accepts_iso_code() {
        let prompt = build_system_prompt(&turn("Jambo", "sw"));
        assert!(prompt.contains("Respond in Swahili."));
    }

    #[test]
    fn test_system_prompt_unknown_language_used_verbatim() {
        let prompt = build_system_prompt(&turn("Bonjour", "French"));
        assert!(prompt.contains("Respond in French."));
    }

    #[test]
    fn test_system_prompt_difficulty_and_corrections() {
        let mut t = turn("Olá", "lang_pt");
        t.difficulty = Some("advanced");
        t.show_grammar_correction = true;

        let prompt = build_system_prompt(&t);
        assert!(prompt.contains("Engage in deeper conversations."));
        assert!(prompt.contains("provide corrections in a friendly way"));
    }

    #[test]
    fn test_unknown_difficulty_defaults_to_beginner() {
        assert_eq!(difficulty_directive(Some("expert")), difficulty_directive(None));
        assert_eq!(
            difficulty_directive(Some("intermediate")),
            "Use more complex vocabulary and grammar structures. Provide more detailed responses."
        );
    }

    // ==================== ChatResponse Deserialization Tests ====================

    #[test]
    fn test_chat_response_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).expect("Should deserialize");
        assert!(response.choices.is_empty());
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            max_tokens: 500,
            temperature: 0.7,
        };

        let json = serde_json::to_string(&request).expect("Should serialize");
        assert!(json.contains("\"max_tokens\":500"));
        assert!(json.contains("0.7"));
    }

    // ==================== chat_reply Tests ====================

    #[tokio::test]
    async fn test_chat_reply_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-openai-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 500
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response("Olá! Tudo bem?")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = create_test_config(&format!("{}/v1/chat/completions", mock_server.uri()));
        let client = reqwest::Client::new();

        let reply = chat_reply(&client, &config, &turn("Olá", "lang_pt")).await.unwrap();
        assert_eq!(reply, "Olá! Tudo bem?");
    }

    #[tokio::test]
    async fn test_chat_reply_no_choices_uses_fallback() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&mock_server)
            .await;

        let config = create_test_config(&mock_server.uri());
        let client = reqwest::Client::new();

        let reply = chat_reply(&client, &config, &turn("Olá", "lang_pt")).await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_chat_reply_upstream_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&mock_server)
            .await;

        let config = create_test_config(&mock_server.uri());
        let client = reqwest::Client::new();

        let err = chat_reply(&client, &config, &turn("Olá", "lang_pt")).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_chat_reply_without_key_makes_no_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut config = create_test_config(&mock_server.uri());
        config.openai_api_key = None;
        let client = reqwest::Client::new();

        assert!(chat_reply(&client, &config, &turn("Olá", "lang_pt")).await.is_err());
    }
}
