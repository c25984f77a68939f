//! Client for the Generative Language API streaming endpoint.
//!
//! With `alt=sse` the endpoint answers with server-sent events, one
//! `GenerateContentResponse` JSON object per `data:` line:
//! ```text
//! data: {"candidates":[{"content":{"parts":[{"text":"Hel"}],"role":"model"}}]}
//!
//! data: {"candidates":[{"content":{"parts":[{"text":"lo"}],"role":"model"},"finishReason":"STOP"}]}
//! ```
//!
//! A complete stream always ends with a candidate carrying `finishReason`.
//! A body that ends without one was cut short and is reported as an error.

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::generation::{FragmentStream, GenerationError, Result, TextGenerator};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// `timeout` covers the whole call, including reading the streamed body.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn stream_url(&self, model: &str) -> String {
        format!("{}/models/{}:streamGenerateContent", self.base_url, model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_stream(&self, model: &str, prompt: &str) -> Result<FragmentStream> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}]
        });

        let res = self
            .http
            .post(self.stream_url(model))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED
                || status == StatusCode::FORBIDDEN
                || (status == StatusCode::BAD_REQUEST && text.contains("API_KEY_INVALID"))
            {
                return Err(GenerationError::Auth(format!("{status}: {text}")));
            }
            return Err(GenerationError::Api(format!("{status}: {text}")));
        }

        tracing::debug!(model, "upstream stream opened");

        let events = res
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(parse_chunk(&event.data)),
                    Err(e) => Some(Err(GenerationError::Stream(e.to_string()))),
                }
            });

        Ok(Box::pin(until_finished(events)))
    }
}

/// Unwrap parsed chunks into fragments. Ends after the first error; if the
/// body runs out before any chunk reported a finish reason, yields one
/// final `Stream` error instead of ending cleanly.
fn until_finished<S>(chunks: S) -> impl futures_util::Stream<Item = Result<Option<String>>> + Send
where
    S: futures_util::Stream<Item = Result<ParsedChunk>> + Send + 'static,
{
    stream::unfold(
        (Box::pin(chunks), false, false),
        |(mut chunks, finished, done)| async move {
            if done {
                return None;
            }
            match chunks.next().await {
                Some(Ok(chunk)) => {
                    let finished = finished || chunk.finished;
                    Some((Ok(chunk.text), (chunks, finished, false)))
                }
                Some(Err(e)) => Some((Err(e), (chunks, finished, true))),
                None if finished => None,
                None => {
                    let err = GenerationError::Stream("stream ended before completion".to_string());
                    Some((Err(err), (chunks, finished, true)))
                }
            }
        },
    )
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ErrorPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

#[derive(Debug, PartialEq)]
struct ParsedChunk {
    text: Option<String>,
    finished: bool,
}

/// One SSE payload. `text` is the non-thought text parts of the first
/// candidate joined, `None` when there are none.
fn parse_chunk(data: &str) -> Result<ParsedChunk> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| GenerationError::Stream(format!("bad chunk: {e}: {data}")))?;

    if let Some(err) = chunk.error {
        let status = err.status.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(GenerationError::Api(format!("{status}: {}", err.message)));
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(ParsedChunk { text: None, finished: false });
    };
    let finished = candidate.finish_reason.is_some();

    let texts: Vec<String> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .collect();

    let text = if texts.is_empty() { None } else { Some(texts.concat()) };
    Ok(ParsedChunk { text, finished })
}
