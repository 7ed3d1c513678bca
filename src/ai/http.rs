//! HTTP client for the AI service
//!
//! - `POST /v1/embed` with `{"text": ..}` returns `{"vector": [..]}`
//! - `POST /v1/parse?filename=..` with the raw document returns `{"chunks": [..]}`
//! - `POST /v1/generate` with a [`GenerateRequest`] returns newline-delimited
//!   JSON, one [`GenerationItem`] per line

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{AiError, AiResult};
use super::{AiCapability, GenerationStream};
use crate::core::config::AiConfig;
use crate::core::types::{Chunk, GenerateRequest, GenerationItem};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    vector: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    chunks: Vec<Chunk>,
}

/// AI capability reached over HTTP
pub struct HttpAiClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    max_message_bytes: usize,
    timeout: Duration,
}

impl HttpAiClient {
    /// Create a client for the service described by `config`
    pub fn new(config: &AiConfig) -> AiResult<Self> {
        // No client-wide timeout: it would also cut off long generation streams
        let client = Client::builder().build().map_err(|e| AiError::Client {
            reason: format!("Failed to create HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_message_bytes: config.max_message_bytes,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.client.post(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => request.header(
                "Authorization",
                format!("Bearer {}", key.expose_secret()),
            ),
            None => request,
        }
    }

    fn check_size(&self, size: usize) -> AiResult<()> {
        if size > self.max_message_bytes {
            return Err(AiError::MessageTooLarge {
                size,
                limit: self.max_message_bytes,
            });
        }
        Ok(())
    }

    /// Collect a response body, failing as soon as it passes the size ceiling
    async fn read_limited(&self, response: Response) -> AiResult<Vec<u8>> {
        let mut body = response.bytes_stream();
        let mut bytes = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            self.check_size(bytes.len() + chunk.len())?;
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

async fn ensure_success(response: Response) -> AiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AiError::Rejected {
        status: status.as_u16(),
        reason: body,
    })
}

#[async_trait]
impl AiCapability for HttpAiClient {
    async fn embed(&self, text: &str) -> AiResult<Vec<f32>> {
        let response = self
            .post("/v1/embed")
            .timeout(self.timeout)
            .json(&EmbedRequest { text })
            .send()
            .await?;
        let body: EmbedResponse = ensure_success(response).await?.json().await?;

        if body.vector.is_empty() {
            return Err(AiError::Protocol {
                reason: "empty embedding vector".to_string(),
            });
        }
        Ok(body.vector)
    }

    async fn parse_and_embed(&self, data: Vec<u8>, filename: &str) -> AiResult<Vec<Chunk>> {
        self.check_size(data.len())?;
        let size = data.len();

        let response = self
            .post("/v1/parse")
            .timeout(self.timeout)
            .query(&[("filename", filename)])
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        if let Some(length) = response.content_length() {
            self.check_size(length as usize)?;
        }
        let bytes = self.read_limited(response).await?;
        let body: ParseResponse = serde_json::from_slice(&bytes)?;

        let chunks: Vec<Chunk> = body
            .chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| Chunk {
                order_index: i,
                ..chunk
            })
            .collect();

        debug!(
            "Parsed '{}' ({} bytes) into {} chunks",
            filename,
            size,
            chunks.len()
        );
        Ok(chunks)
    }

    async fn generate_stream(&self, request: GenerateRequest) -> AiResult<GenerationStream> {
        self.check_size(request.prompt.len())?;

        let response = self.post("/v1/generate").json(&request).send().await?;
        let response = ensure_success(response).await?;

        Ok(decode_ndjson(response.bytes_stream(), self.max_message_bytes))
    }
}

struct LineState<S> {
    body: Pin<Box<S>>,
    buffer: Vec<u8>,
    max_line_bytes: usize,
    finished: bool,
}

impl<S> LineState<S> {
    fn fail(&mut self, error: AiError) -> AiResult<GenerationItem> {
        self.finished = true;
        self.buffer.clear();
        Err(error)
    }

    fn line_too_large(&mut self, size: usize) -> AiResult<GenerationItem> {
        let limit = self.max_line_bytes;
        self.fail(AiError::MessageTooLarge { size, limit })
    }
}

/// Turn a byte stream of newline-delimited JSON into generation items.
///
/// Blank lines are skipped. A line longer than `max_line_bytes` is a
/// `MessageTooLarge` error, reported as soon as the pending bytes pass the
/// limit. Any error is yielded once and ends the stream.
pub(crate) fn decode_ndjson<S, B, E>(body: S, max_line_bytes: usize) -> GenerationStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<AiError> + Send + 'static,
{
    let state = LineState {
        body: Box::pin(body),
        buffer: Vec::new(),
        max_line_bytes,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                if pos > state.max_line_bytes {
                    let item = state.line_too_large(pos);
                    return Some((item, state));
                }
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                if let Some(item) = parse_line(&line) {
                    let item = item.or_else(|e| state.fail(e));
                    return Some((item, state));
                }
                continue;
            }

            if state.buffer.len() > state.max_line_bytes {
                let size = state.buffer.len();
                let item = state.line_too_large(size);
                return Some((item, state));
            }

            if state.finished {
                let rest = std::mem::take(&mut state.buffer);
                return parse_line(&rest).map(|item| (item, state));
            }

            match state.body.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    let item = state.fail(e.into());
                    return Some((item, state));
                }
                None => state.finished = true,
            }
        }
    })
    .boxed()
}

fn parse_line(line: &[u8]) -> Option<AiResult<GenerationItem>> {
    let line = trim_whitespace(line);
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_slice(line).map_err(AiError::from))
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
