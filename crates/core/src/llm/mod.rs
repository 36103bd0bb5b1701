pub mod error;
pub mod openai;
pub mod prompt;

#[derive(Debug, Clone)]
pub enum Provider {
    OpenAI,
}

#[async_trait::async_trait]
pub trait SummaryClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Sends `prompt` to the model and returns its raw text reply.
    async fn summarize(&self, prompt: &str) -> anyhow::Result<String>;
}
