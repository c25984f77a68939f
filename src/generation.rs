use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Chunks in arrival order. `None` is a chunk that carried no text.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Option<String>>> + Send>>;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Submit `prompt` to `model` and return the streamed response.
    async fn generate_stream(&self, model: &str, prompt: &str) -> Result<FragmentStream>;
}

/// Drain `stream`, concatenating chunk text. Stops at the first error and
/// returns it, discarding whatever was collected so far.
pub async fn collect_fragments(mut stream: FragmentStream) -> Result<String> {
    let mut out = String::new();
    while let Some(item) = stream.next().await {
        if let Some(text) = item? {
            out.push_str(&text);
        }
    }
    Ok(out)
}
