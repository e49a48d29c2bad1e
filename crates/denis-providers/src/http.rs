//! Shared OpenAI-compatible chat transport, used by every provider family
//! whose wire format is a `POST {endpoint}/chat/completions` call
//! (llamacpp, groq, openrouter, vllm, perplexity). Grounded on
//! `inference/provider_adapter.py`'s `_wrap_generate`/`_error_result` shape:
//! adapters never throw, they return a sealed `ProviderCallResult`.

use denis_core::{CancellationToken, Engine, Message, ProviderCallResult, ProviderFamily};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(flatten)]
    params: &'a HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Call an OpenAI-compatible `/chat/completions` endpoint and normalize the
/// result to [`ProviderCallResult`] (spec.md §4.3). Never panics and never
/// returns an `Err` across the adapter boundary — failures are folded into
/// `ProviderCallResult::failure`.
pub async fn openai_compatible_chat(
    http: &reqwest::Client,
    family: ProviderFamily,
    api_key: Option<&str>,
    engine: &Engine,
    messages: &[Message],
    timeout: Duration,
    params: &HashMap<String, Value>,
    mut cancel: CancellationToken,
) -> ProviderCallResult {
    let url = format!("{}/chat/completions", engine.endpoint.trim_end_matches('/'));
    let body = ChatCompletionRequest {
        model: &engine.model,
        messages: messages
            .iter()
            .map(|m| WireMessage {
                role: &m.role,
                content: &m.content,
            })
            .collect(),
        params,
    };

    let started = Instant::now();
    let mut request = http
        .post(&url)
        .json(&body)
        .timeout(timeout)
        .header(denis_core::hop::HOP_HEADER, denis_core::hop::next().to_string());
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            let elapsed = started.elapsed().as_millis() as u64;
            return ProviderCallResult::failure(
                family,
                engine.engine_id.clone(),
                engine.model.clone(),
                "cancelled".to_string(),
                elapsed,
            );
        }
        result = request.send() => match result {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                let elapsed = started.elapsed().as_millis() as u64;
                return ProviderCallResult::failure(
                    family,
                    engine.engine_id.clone(),
                    engine.model.clone(),
                    format!("{}_timeout", family.as_str()),
                    elapsed,
                );
            }
            Err(err) => {
                let elapsed = started.elapsed().as_millis() as u64;
                return ProviderCallResult::failure(
                    family,
                    engine.engine_id.clone(),
                    engine.model.clone(),
                    format!("exception:{}", first_line(&err.to_string())),
                    elapsed,
                );
            }
        },
    };

    let status = response.status();
    if !status.is_success() {
        let elapsed = started.elapsed().as_millis() as u64;
        return ProviderCallResult::failure(
            family,
            engine.engine_id.clone(),
            engine.model.clone(),
            format!("{}_http_{}", family.as_str(), status.as_u16()),
            elapsed,
        );
    }

    let parsed: Result<ChatCompletionResponse, _> = response.json().await;
    let elapsed = started.elapsed().as_millis() as u64;
    let parsed = match parsed {
        Ok(parsed) => parsed,
        Err(err) => {
            return ProviderCallResult::failure(
                family,
                engine.engine_id.clone(),
                engine.model.clone(),
                format!("exception:{}", first_line(&err.to_string())),
                elapsed,
            );
        }
    };

    let text = parsed
        .choices
        .first()
        .map(|c| c.message.content.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return ProviderCallResult::failure(
            family,
            engine.engine_id.clone(),
            engine.model.clone(),
            format!("{}_empty_response", family.as_str()),
            elapsed,
        );
    }

    let (input_tokens, output_tokens) = parsed
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));
    let cost_usd_estimated = (f64::from(input_tokens + output_tokens) / 1000.0) * engine.cost_factor;

    ProviderCallResult::success(
        family,
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

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or(s)
}
