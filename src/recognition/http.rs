//! OpenAI-compatible chat-completions client for vision models.
//!
//! Sends one user message containing the instruction and the image as a
//! `data:` URL, and returns `choices[0].message.content`.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{RecognitionError, RecognitionService};
use crate::scanner::EncodedImage;

/// Default endpoint (Groq's OpenAI-compatible API).
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

const MAX_ERROR_BODY: usize = 200;

/// Connection settings for [`ChatCompletionsClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Full URL of the chat-completions endpoint.
    pub api_url: String,
    /// Bearer token; requests are sent unauthenticated when empty.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on answer length.
    pub max_tokens: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            max_tokens: 256,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AnswerMessage,
}

#[derive(Debug, Deserialize)]
struct AnswerMessage {
    content: Option<String>,
}

/// Blocking client for chat-completions vision endpoints.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    config: HttpClientConfig,
}

impl ChatCompletionsClient {
    /// Build a client with the configured timeout.
    pub fn new(config: HttpClientConfig) -> Result<Self, RecognitionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// The configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request<'a>(&'a self, image: &EncodedImage, instruction: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: instruction },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ],
            }],
            max_tokens: self.config.max_tokens,
            temperature: 0.0,
        }
    }
}

impl RecognitionService for ChatCompletionsClient {
    fn recognize(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<String, RecognitionError> {
        let body = self.build_request(image, instruction);

        let mut request = self.client.post(&self.config.api_url).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                RecognitionError::Timeout(self.config.timeout.as_secs())
            } else {
                RecognitionError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response.text().map_err(|e| {
            if e.is_timeout() {
                RecognitionError::Timeout(self.config.timeout.as_secs())
            } else {
                RecognitionError::Transport(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(RecognitionError::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }

        parse_answer(&text)
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}

fn parse_answer(body: &str) -> Result<String, RecognitionError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RecognitionError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| RecognitionError::MalformedResponse("response has no choices".to_string()))
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
