//! The inference request data model (spec.md §3.3).

use crate::error::{DenisError, DenisResult};
use crate::types::{RequestId, SessionId};
use serde::{Deserialize, Serialize};

/// A single role-tagged chat message, as carried in [`RequestPayload::messages`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Conversational role (`system`, `user`, `assistant`, ...). Opaque to
    /// the core — prompt templating is explicitly out of scope (spec.md §1).
    pub role: String,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Construct a `user`-role message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Construct a `system`-role message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// The request payload: at minimum a list of messages, plus the handful of
/// generation knobs the core must see in order to shape a plan's budget
/// (spec.md §3.3, §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestPayload {
    /// Conversation so far.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Requested output token ceiling, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// `{ request_id, session_id, route_type, task_type, payload, max_latency_ms?,
/// max_cost_usd?, cancel_key? }` (spec.md §3.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Caller-generated identifier; flows unchanged into every trace.
    pub request_id: RequestId,
    /// Caller-supplied session identifier, opaque to the core.
    pub session_id: Option<SessionId>,
    /// Coarse routing category (e.g. `chat`, `tool_run`), consulted by the
    /// scheduler's parallelism limits (spec.md §4.4) and by the Gateway
    /// Router's task-profile resolution (spec.md §4.5).
    pub route_type: String,
    /// Finer-grained task classification, paired with `route_type`'s
    /// sibling `phase` at the Gateway Router layer.
    pub task_type: String,
    /// Request body.
    pub payload: RequestPayload,
    /// Caller's latency ceiling, if any.
    pub max_latency_ms: Option<u64>,
    /// Caller's cost ceiling, in USD, if any (spec.md §4.6, §5 cost ceiling).
    pub max_cost_usd: Option<f64>,
    /// Opaque key a caller can use to correlate a later cancellation signal.
    pub cancel_key: Option<String>,
}

impl InferenceRequest {
    /// Start building an [`InferenceRequest`].
    #[must_use]
    pub fn builder(request_id: impl Into<RequestId>) -> InferenceRequestBuilder {
        InferenceRequestBuilder::new(request_id)
    }
}

/// Builder for [`InferenceRequest`].
#[derive(Debug)]
pub struct InferenceRequestBuilder {
    request_id: RequestId,
    session_id: Option<SessionId>,
    route_type: Option<String>,
    task_type: Option<String>,
    messages: Vec<Message>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    max_latency_ms: Option<u64>,
    max_cost_usd: Option<f64>,
    cancel_key: Option<String>,
}

impl InferenceRequestBuilder {
    /// Start a new builder for the given request id.
    #[must_use]
    pub fn new(request_id: impl Into<RequestId>) -> Self {
        Self {
            request_id: request_id.into(),
            session_id: None,
            route_type: None,
            task_type: None,
            messages: Vec::new(),
            max_tokens: None,
            temperature: None,
            max_latency_ms: None,
            max_cost_usd: None,
            cancel_key: None,
        }
    }

    /// Set the session id.
    #[must_use]
    pub fn session_id(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the route type.
    #[must_use]
    pub fn route_type(mut self, route_type: impl Into<String>) -> Self {
        self.route_type = Some(route_type.into());
        self
    }

    /// Set the task type.
    #[must_use]
    pub fn task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    /// Append a message.
    #[must_use]
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set all messages at once.
    #[must_use]
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Set `max_tokens`.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set `temperature`.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the caller's latency ceiling.
    #[must_use]
    pub fn max_latency_ms(mut self, max_latency_ms: u64) -> Self {
        self.max_latency_ms = Some(max_latency_ms);
        self
    }

    /// Set the caller's cost ceiling.
    #[must_use]
    pub fn max_cost_usd(mut self, max_cost_usd: f64) -> Self {
        self.max_cost_usd = Some(max_cost_usd);
        self
    }

    /// Set the cancellation correlation key.
    #[must_use]
    pub fn cancel_key(mut self, cancel_key: impl Into<String>) -> Self {
        self.cancel_key = Some(cancel_key.into());
        self
    }

    /// Build the request.
    ///
    /// # Errors
    /// Returns [`DenisError::InvalidRequest`] when `route_type`/`task_type`
    /// are unset or `messages` is empty — the one exception propagated
    /// synchronously to the caller from `route()` (spec.md §7).
    pub fn build(self) -> DenisResult<InferenceRequest> {
        let route_type = self
            .route_type
            .ok_or_else(|| DenisError::invalid_field("route_type", "route_type is required"))?;
        let task_type = self
            .task_type
            .ok_or_else(|| DenisError::invalid_field("task_type", "task_type is required"))?;

        if self.messages.is_empty() {
            return Err(DenisError::invalid_field(
                "messages",
                "messages cannot be empty",
            ));
        }

        Ok(InferenceRequest {
            request_id: self.request_id,
            session_id: self.session_id,
            route_type,
            task_type,
            payload: RequestPayload {
                messages: self.messages,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            },
            max_latency_ms: self.max_latency_ms,
            max_cost_usd: self.max_cost_usd,
            cancel_key: self.cancel_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_route_and_task_type() {
        let result = InferenceRequest::builder(RequestId::new("r1"))
            .message(Message::user("hi"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_requires_nonempty_messages() {
        let result = InferenceRequest::builder(RequestId::new("r1"))
            .route_type("chat")
            .task_type("chat_general")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_succeeds_with_required_fields() {
        let request = InferenceRequest::builder(RequestId::new("r1"))
            .route_type("chat")
            .task_type("chat_general")
            .message(Message::user("hello"))
            .max_tokens(256)
            .build()
            .expect("should build");
        assert_eq!(request.payload.messages.len(), 1);
        assert_eq!(request.payload.max_tokens, Some(256));
    }
}
