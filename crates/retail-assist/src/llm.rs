//! Chat-completion client for the Groq OpenAI-compatible API.
//!
//! The reply is streamed as server-sent events and reassembled in full before
//! it is returned: placeholders can straddle event boundaries, so nothing
//! downstream may see a partial reply.

use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use serde::{Deserialize, Serialize};

use retail_core::config::LlmSettings;

use crate::error::AssistError;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Full reply text for one system + user prompt pair.
    async fn complete(&self, system: &str, user: &str) -> Result<String, AssistError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Reassembles `data:` lines from arbitrarily split byte chunks and collects
/// the delta text.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

impl SseAccumulator {
    pub fn new() -> Self { Self::default() }

    /// `[DONE]` has been seen; later input is ignored.
    pub fn is_done(&self) -> bool { self.done }

    pub fn push(&mut self, bytes: &[u8]) {
        if self.done {
            return;
        }
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.handle_line(&String::from_utf8_lossy(&line));
            if self.done {
                self.pending.clear();
                return;
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        let Some(payload) = line.strip_prefix("data:") else {
            return;
        };
        let payload = payload.trim();
        if payload == "[DONE]" {
            self.done = true;
            return;
        }
        match serde_json::from_str::<StreamChunk>(payload) {
            Ok(chunk) => {
                if let Some(content) = chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
                    self.text.push_str(&content);
                }
            }
            Err(e) => tracing::debug!("skipping unparseable stream event: {e}"),
        }
    }

    /// Flush any unterminated last line and return the trimmed reply.
    pub fn finish(mut self) -> String {
        if !self.done && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.handle_line(&String::from_utf8_lossy(&rest));
        }
        self.text.trim().to_string()
    }
}

pub struct GroqClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl GroqClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self { http: reqwest::Client::new(), settings }
    }

    fn api_key(&self) -> Result<String, AssistError> {
        let var = &self.settings.api_key_env;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(AssistError::MissingCredential(var.clone())),
        }
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, AssistError> {
        let key = self.api_key()?;
        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: self.settings.temperature,
            max_completion_tokens: self.settings.max_completion_tokens,
            top_p: 1.0,
            stream: true,
        };

        let response = self.http.post(&url).bearer_auth(key).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistError::Provider(format!(
                "HTTP {}: {}",
                status.as_u16(),
                sanitize_http_error_body(&body)
            )));
        }

        let mut acc = SseAccumulator::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            acc.push(&chunk?);
            if acc.is_done() {
                break;
            }
        }
        let reply = acc.finish();
        tracing::debug!("model reply received ({} chars)", reply.chars().count());
        Ok(reply)
    }
}

const MAX_ERROR_BODY_CHARS: usize = 256;

fn sanitize_http_error_body(raw: &str) -> String {
    let mut sanitized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Ok(re) = Regex::new(r"gsk_[A-Za-z0-9]{16,}") {
        sanitized = re.replace_all(&sanitized, "[REDACTED]").into_owned();
    }
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened: String = sanitized.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return format!("{shortened}...[truncated]");
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(content: &str) -> String {
        format!("data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n\n", serde_json::json!(content))
    }

    #[test]
    fn joins_deltas_until_done() {
        let mut acc = SseAccumulator::new();
        acc.push(event(" Sure, call ").as_bytes());
        acc.push(event("[PHONE_1].").as_bytes());
        acc.push(b"data: [DONE]\n\n");
        acc.push(event("ignored").as_bytes());
        assert!(acc.is_done());
        assert_eq!(acc.finish(), "Sure, call [PHONE_1].");
    }

    #[test]
    fn reassembles_lines_split_across_chunks() {
        let stream = format!("{}{}data: [DONE]\n", event("Hello [PHO"), event("NE_1]!"));
        let mut acc = SseAccumulator::new();
        for piece in stream.as_bytes().chunks(7) {
            acc.push(piece);
        }
        assert_eq!(acc.finish(), "Hello [PHONE_1]!");
    }

    #[test]
    fn role_only_and_comment_events_add_nothing() {
        let mut acc = SseAccumulator::new();
        acc.push(b": keep-alive\n");
        acc.push(b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n");
        acc.push(event("ok").as_bytes());
        assert_eq!(acc.finish(), "ok");
    }

    #[test]
    fn error_body_is_collapsed_and_capped() {
        let body = format!("bad   key\n gsk_{}  {}", "a".repeat(20), "x".repeat(400));
        let cleaned = sanitize_http_error_body(&body);
        assert!(cleaned.starts_with("bad key [REDACTED] "));
        assert!(cleaned.ends_with("...[truncated]"));
    }

    #[tokio::test]
    async fn missing_key_is_reported_by_name() {
        let settings = LlmSettings { api_key_env: "RETAIL_TEST_UNSET_KEY".into(), ..LlmSettings::default() };
        let client = GroqClient::new(settings);
        let err = client.complete("s", "u").await.unwrap_err();
        assert!(matches!(err, AssistError::MissingCredential(ref v) if v == "RETAIL_TEST_UNSET_KEY"));
    }
}
