//! Anthropic Claude API adapter (spec.md §3.1, §4.3).
//!
//! Anthropic's Messages API differs structurally from the OpenAI-compatible
//! families this crate otherwise shares a transport for: authentication is
//! `x-api-key`/`anthropic-version` headers rather than a bearer token, the
//! system prompt is a top-level field rather than a `system`-role message,
//! and usage is always reported (no missing-usage fallback needed).

use async_trait::async_trait;
use denis_core::{CancellationToken, Engine, Message, ProviderAdapter, ProviderCallResult, ProviderFamily};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    #[serde(flatten)]
    params: &'a HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Adapter for the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl AnthropicAdapter {
    /// Build a new adapter. `api_key` is `None` when unconfigured, in which
    /// case [`ProviderAdapter::is_available`] reports `false`.
    #[must_use]
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }

    fn system_prompt(messages: &[Message]) -> Option<&str> {
        messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider_family(&self) -> ProviderFamily {
        ProviderFamily::Anthropic
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn chat(
        &self,
        engine: &Engine,
        messages: &[Message],
        timeout: Duration,
        params: &HashMap<String, serde_json::Value>,
        mut cancel: CancellationToken,
    ) -> ProviderCallResult {
        let Some(api_key) = self.api_key.as_deref() else {
            return ProviderCallResult::failure(
                ProviderFamily::Anthropic,
                engine.engine_id.clone(),
                engine.model.clone(),
                "anthropic_no_api_key",
                0,
            );
        };

        let url = format!("{}/v1/messages", engine.endpoint.trim_end_matches('/'));
        let system = Self::system_prompt(messages);
        let conversational: Vec<WireMessage<'_>> = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| WireMessage {
                role: &m.role,
                content: &m.content,
            })
            .collect();

        let body = MessagesRequest {
            model: &engine.model,
            system,
            messages: conversational,
            max_tokens: engine.max_output,
            params,
        };

        let started = Instant::now();
        let request = self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header(denis_core::hop::HOP_HEADER, denis_core::hop::next().to_string())
            .json(&body)
            .timeout(timeout);

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return ProviderCallResult::failure(
                    ProviderFamily::Anthropic,
                    engine.engine_id.clone(),
                    engine.model.clone(),
                    "cancelled",
                    started.elapsed().as_millis() as u64,
                );
            }
            result = request.send() => match result {
                Ok(response) => response,
                Err(err) if err.is_timeout() => {
                    return ProviderCallResult::failure(
                        ProviderFamily::Anthropic,
                        engine.engine_id.clone(),
                        engine.model.clone(),
                        "anthropic_timeout",
                        started.elapsed().as_millis() as u64,
                    );
                }
                Err(err) => {
                    return ProviderCallResult::failure(
                        ProviderFamily::Anthropic,
                        engine.engine_id.clone(),
                        engine.model.clone(),
                        format!("exception:{}", first_line(&err.to_string())),
                        started.elapsed().as_millis() as u64,
                    );
                }
            },
        };

        let status = response.status();
        if !status.is_success() {
            return ProviderCallResult::failure(
                ProviderFamily::Anthropic,
                engine.engine_id.clone(),
                engine.model.clone(),
                format!("anthropic_http_{}", status.as_u16()),
                started.elapsed().as_millis() as u64,
            );
        }

        let parsed: Result<MessagesResponse, _> = response.json().await;
        let elapsed = started.elapsed().as_millis() as u64;
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                return ProviderCallResult::failure(
                    ProviderFamily::Anthropic,
                    engine.engine_id.clone(),
                    engine.model.clone(),
                    format!("exception:{}", first_line(&err.to_string())),
                    elapsed,
                );
            }
        };

        let text = parsed
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string();

        if text.is_empty() {
            return ProviderCallResult::failure(
                ProviderFamily::Anthropic,
                engine.engine_id.clone(),
                engine.model.clone(),
                "anthropic_empty_response",
                elapsed,
            );
        }

        let (input_tokens, output_tokens) = parsed
            .usage
            .map(|u| (u.input_tokens, u.output_tokens))
            .unwrap_or((0, 0));
        let cost_usd_estimated = (f64::from(input_tokens + output_tokens) / 1000.0) * engine.cost_factor;

        ProviderCallResult::success(
            ProviderFamily::Anthropic,
            engine.engine_id.clone(),
            engine.model.clone(),
            text,
            input_tokens,
            output_tokens,
            elapsed,
            cost_usd_estimated,
            None,
        )
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or(s)
}
