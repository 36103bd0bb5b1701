use crate::config::Settings;
use crate::llm::error::{LlmDiagnosticsError, LlmStage};
use crate::llm::{Provider, SummaryClient};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct OpenAiOptions {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for OpenAiOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OpenAiOptions {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_tokens: std::env::var("OPENAI_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_secs: std::env::var("OPENAI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Chat Completions client. One user message in, the first choice's text out.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::with_options(settings, OpenAiOptions::from_env())
    }

    pub fn with_options(settings: &Settings, opts: OpenAiOptions) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key()?.to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url: opts.base_url,
            model: opts.model,
            max_tokens: opts.max_tokens,
        })
    }

    async fn create_chat_completion(
        &self,
        req: ChatCompletionRequest<'_>,
    ) -> anyhow::Result<ChatCompletionResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                LlmDiagnosticsError::new(Provider::OpenAI, LlmStage::Transport, e.to_string())
            })?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read OpenAI response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError::new(
                Provider::OpenAI,
                LlmStage::Http,
                format!("status={status}"),
            )
            .with_status(status.as_u16())
            .with_raw_body(text)
            .into());
        }

        serde_json::from_str::<ChatCompletionResponse>(&text).map_err(|e| {
            LlmDiagnosticsError::new(Provider::OpenAI, LlmStage::Decode, e.to_string())
                .with_raw_body(text)
                .into()
        })
    }

    fn first_choice_text(res: ChatCompletionResponse) -> String {
        res.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SummaryClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn summarize(&self, prompt: &str) -> anyhow::Result<String> {
        let req = ChatCompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let res = self.create_chat_completion(req).await?;
        if let Some(usage) = &res.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenAI completion finished"
            );
        }
        Ok(Self::first_choice_text(res))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,

    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn completions(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer sk-test");
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Incorrect API key provided"}})),
            );
        }

        let echoed = format!(
            "model={} max_tokens={} role={} prompt={}",
            body["model"].as_str().unwrap_or_default(),
            body["max_tokens"],
            body["messages"][0]["role"].as_str().unwrap_or_default(),
            body["messages"][0]["content"].as_str().unwrap_or_default(),
        );
        (
            StatusCode::OK,
            Json(json!({
                "id": "chatcmpl-1",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": echoed}},
                    {"index": 1, "message": {"role": "assistant", "content": "second"}}
                ],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })),
        )
    }

    async fn client(api_key: &str) -> OpenAiClient {
        let base_url = testing::serve(Router::new().route("/v1/chat/completions", post(completions))).await;
        let settings = Settings {
            openai_api_key: Some(api_key.to_string()),
            ..Settings::default()
        };
        OpenAiClient::with_options(
            &settings,
            OpenAiOptions {
                base_url,
                ..OpenAiOptions::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_first_choice_text() {
        let text = client("sk-test").await.summarize("hello pepe").await.unwrap();
        assert_eq!(
            text,
            "model=gpt-4o-mini max_tokens=1000 role=user prompt=hello pepe"
        );
    }

    #[tokio::test]
    async fn api_errors_carry_diagnostics() {
        let err = client("sk-wrong").await.summarize("hello").await.unwrap_err();
        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, LlmStage::Http);
        assert_eq!(diag.status, Some(401));
        assert_eq!(diag.api_message().as_deref(), Some("Incorrect API key provided"));
    }

    #[test]
    fn missing_choices_yield_empty_text() {
        let res: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(OpenAiClient::first_choice_text(res), "");

        let res: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        assert_eq!(OpenAiClient::first_choice_text(res), "");
    }

    #[test]
    fn requires_api_key() {
        assert!(OpenAiClient::from_settings(&Settings::default()).is_err());
    }
}
