//! OpenAI-compatible chat-completion client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{OnlineAnalysis, RemoteAnalyzer};
use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};

/// Longest slice of an error body kept in [`RemoteError::Status`].
const MAX_ERROR_BODY_LEN: usize = 200;

const SYSTEM_PROMPT: &str = "You are a writing assistant that analyzes text and provides two types of feedback: \
1. Grammar corrections: identify grammar or style issues with the text. \
2. Autocomplete suggestions: provide possible ways to complete the text if it seems incomplete. \
Respond with JSON in this format: \
{ \"grammar\": [{\"incorrect\": string, \"correct\": string, \"context\": string}], \"autocomplete\": [string] }";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

/// Sends one chat-completion request per analysis.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionClient {
    /// Build a client from configuration. The API key may be absent; calls
    /// then fail with [`RemoteError::MissingApiKey`].
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.resolved_api_key(),
        })
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether an API key is available.
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl RemoteAnalyzer for ChatCompletionClient {
    #[tracing::instrument(skip_all, fields(text_len = text.len(), model = %self.model))]
    async fn analyze_online(&self, text: &str) -> RemoteResult<OnlineAnalysis> {
        let api_key = self.api_key.as_deref().ok_or(RemoteError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: text,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_LEN).to_string(),
            });
        }

        let envelope: ChatResponse =
            serde_json::from_str(&body).map_err(|err| RemoteError::Parse(err.to_string()))?;
        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_else(|| "{}".to_string());

        let analysis = OnlineAnalysis::from_json(&content)?;
        tracing::debug!(
            grammar = analysis.grammar.len(),
            autocomplete = analysis.autocomplete.len(),
            "remote analysis complete"
        );
        Ok(analysis)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> ChatCompletionClient {
        ChatCompletionClient::new(&RemoteConfig {
            base_url: format!("{}/v1/", server.uri()),
            model: "gpt-4o".into(),
            api_key: api_key.map(str::to_string),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn parses_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "response_format": { "type": "json_object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"grammar":[{"incorrect":"we was","correct":"we were","context":"we was late"}],"autocomplete":["late again"]}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        assert!(client.endpoint().ends_with("/v1/chat/completions"));
        let analysis = client.analyze_online("we was late").await.unwrap();
        assert_eq!(analysis.grammar[0].correct, "we were");
        assert_eq!(analysis.autocomplete, vec!["late again"]);
    }

    #[tokio::test]
    async fn non_array_fields_degrade_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion(r#"{"grammar":{"x":1},"autocomplete":"soon"}"#)),
            )
            .mount(&server)
            .await;

        let analysis = client_for(&server, Some("k"))
            .analyze_online("text")
            .await
            .unwrap();
        assert_eq!(analysis, OnlineAnalysis::default());
    }

    #[tokio::test]
    async fn malformed_content_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json at all")))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k"))
            .analyze_online("text")
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn server_error_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k"))
            .analyze_online("text")
            .await
            .unwrap_err();
        match err {
            RemoteError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = ChatCompletionClient {
            api_key: None,
            ..client_for(&server, Some("placeholder"))
        };
        assert!(!client.has_api_key());
        let err = client.analyze_online("text").await.unwrap_err();
        assert!(matches!(err, RemoteError::MissingApiKey));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
