use async_trait::async_trait;
use banter_core::{BackendError, FragmentStream, GenerationBackend};
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::sse::SseDecoder;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Streaming generation backend for OpenAI-compatible chat completion APIs.
///
/// The assembled prompt is sent as a single user message; content deltas
/// of the streamed response are yielded as fragments in arrival order.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating OpenAiProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": true,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

/// Extract the text carried by one streamed chunk, if any.
fn parse_chunk(data: &str) -> Result<Option<String>, BackendError> {
    let chunk: ChunkResponse = serde_json::from_str(data)
        .map_err(|e| BackendError::InvalidResponse(format!("{e}: {data}")))?;

    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();

    Ok((!text.is_empty()).then_some(text))
}

#[async_trait]
impl GenerationBackend for OpenAiProvider {
    fn stream(&self, prompt: String) -> FragmentStream {
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&prompt));
        let model = self.model.clone();

        Box::pin(async_stream::stream! {
            debug!("Sending streaming request: model={model}");

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(BackendError::Request(e.to_string()));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                yield Err(BackendError::Status { status: status.as_u16(), body });
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            let mut fragments = 0_usize;

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(BackendError::Stream(e.to_string()));
                        return;
                    }
                };

                for frame in decoder.push(&chunk) {
                    if frame.data.trim() == "[DONE]" {
                        debug!("Stream complete: {fragments} fragments");
                        return;
                    }
                    match parse_chunk(&frame.data) {
                        Ok(Some(text)) => {
                            fragments += 1;
                            yield Ok(text);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if let Some(frame) = decoder.finish() {
                if frame.data.trim() != "[DONE]" {
                    match parse_chunk(&frame.data) {
                        Ok(Some(text)) => {
                            yield Ok(text);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                        }
                    }
                }
            }
        })
    }
}
