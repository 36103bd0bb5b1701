use crate::llm::Provider;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmStage {
    Transport,
    Http,
    Decode,
}

impl LlmStage {
    pub fn as_str(self) -> &'static str {
        match self {
            LlmStage::Transport => "transport",
            LlmStage::Http => "http",
            LlmStage::Decode => "decode",
        }
    }
}

/// A failed model call. Callers can `downcast_ref` this out of an
/// `anyhow::Error` to get at the upstream body.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: LlmStage,
    pub status: Option<u16>,
    pub detail: String,
    pub raw_body: Option<String>,
}

impl LlmDiagnosticsError {
    pub fn new(provider: Provider, stage: LlmStage, detail: impl Into<String>) -> Self {
        Self {
            provider,
            stage,
            status: None,
            detail: detail.into(),
            raw_body: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_raw_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    /// `error.message` from an OpenAI-style error body, if there is one.
    pub fn api_message(&self) -> Option<String> {
        let body = self.raw_body.as_deref()?;
        let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
        json.pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "summarization failed (provider={:?}, stage={}",
            self.provider,
            self.stage.as_str()
        )?;
        if let Some(status) = self.status {
            write!(f, ", status={status}")?;
        }
        match self.api_message() {
            Some(msg) => write!(f, "): {msg}"),
            None => write!(f, "): {}", self.detail),
        }
    }
}

impl std::error::Error for LlmDiagnosticsError {}
