//! OpenAI-compatible chat-completions client.
//!
//! Groq, OpenAI, Together and local servers such as Ollama all expose the same
//! `POST {base_url}/chat/completions` shape, so one client covers them.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use concierge_core::config::LlmConfig;

use crate::error::LlmError;
use crate::message::ChatMessage;
use crate::ChatModel;

/// Longest slice of an error body kept in [`LlmError::Status`].
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Serialize)]
struct ApiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible chat-completions endpoint.
pub struct OpenAiCompatibleClient {
    provider: String,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    api_key: Option<String>,
    api_key_env: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl OpenAiCompatibleClient {
    /// Build a client from the `[llm]` config section.
    ///
    /// The API key is read from the environment variable named by
    /// `api_key_env`. A missing key is not an error here; it surfaces as
    /// [`LlmError::MissingApiKey`] on the first call so rule-based replies
    /// keep working offline.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!(env = %config.api_key_env, provider = %config.provider, "LLM API key not set");
        }

        Self::build(
            config,
            api_key,
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    /// Build a client with an explicit key, bypassing the environment.
    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::build(
            config,
            Some(api_key.into()),
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    /// Override the request timeout.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, LlmError> {
        let http = build_http(timeout)?;
        Ok(Self {
            timeout,
            http,
            ..self
        })
    }

    fn build(
        config: &LlmConfig,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            provider: config.provider.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_key,
            api_key_env: config.api_key_env.clone(),
            timeout,
            http: build_http(timeout)?,
        })
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout.as_secs().max(1))
        } else {
            LlmError::Request(err.to_string())
        }
    }
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| LlmError::Request(format!("Failed to build HTTP client: {}", e)))
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey(self.api_key_env.clone()))?;

        let request = ApiChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        debug!(
            provider = %self.provider,
            model = %self.model,
            messages = messages.len(),
            "Sending chat completion"
        );

        let response = self
            .http
            .post(self.chat_completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: ApiChatResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?
            .message
            .content
            .unwrap_or_default();

        debug!(chars = content.len(), "Chat completion received");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            api_key_env: "CONCIERGE_TEST_UNSET_KEY".to_string(),
            ..LlmConfig::default()
        }
    }

    fn client(server: &MockServer) -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::with_api_key(&config(&server.uri()), "test-key").unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "Hello there" } },
                    { "message": { "role": "assistant", "content": "ignored" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server)
            .complete(&[ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply, "Hello there");
    }

    #[tokio::test]
    async fn test_request_body_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(wiremock::matchers::body_partial_json(json!({
                "model": "llama-3.2-3b-preview",
                "max_tokens": 4096,
                "stream": false,
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hi" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "ok" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server)
            .complete(&[ChatMessage::system("be brief"), ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client(&server).complete(&[]).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_non_success_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        match client(&server).complete(&[]).await.unwrap_err() {
            LlmError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).complete(&[]).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(json!({ "choices": [{ "message": { "content": "late" } }] })),
            )
            .mount(&server)
            .await;

        let client = client(&server)
            .with_timeout(Duration::from_millis(200))
            .unwrap();
        let err = client.complete(&[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::from_config(&config(&server.uri())).unwrap();
        match client.complete(&[ChatMessage::user("hi")]).await.unwrap_err() {
            LlmError::MissingApiKey(env) => assert_eq!(env, "CONCIERGE_TEST_UNSET_KEY"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("  short  "), "short");
        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), ERROR_BODY_LIMIT + 3);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client =
            OpenAiCompatibleClient::with_api_key(&config("http://localhost:1/v1/"), "k").unwrap();
        assert_eq!(
            client.chat_completions_url(),
            "http://localhost:1/v1/chat/completions"
        );
        assert_eq!(client.model_name(), "llama-3.2-3b-preview");
    }
}
