//! Test fixtures: engines, registries, and requests for the end-to-end
//! scenarios.

use denis_core::engine::{TAG_INTERNET_REQUIRED, TAG_LOCAL};
use denis_core::{Engine, EngineRegistry, InferenceRequest, Message, ProviderFamily, RequestId};

/// A local `llamacpp` engine pointed at a mock server.
pub fn local_engine(id: &str, endpoint: &str, priority: u32) -> Engine {
    Engine::builder(id, ProviderFamily::LlamaCpp)
        .endpoint(endpoint)
        .model(format!("{id}-model"))
        .tag(TAG_LOCAL)
        .priority(priority)
        .build()
        .expect("valid local engine")
}

/// A booster `groq` engine pointed at a mock server.
pub fn booster_engine(id: &str, endpoint: &str, priority: u32) -> Engine {
    Engine::builder(id, ProviderFamily::Groq)
        .endpoint(endpoint)
        .model(format!("{id}-model"))
        .tag(TAG_INTERNET_REQUIRED)
        .priority(priority)
        .build()
        .expect("valid booster engine")
}

/// A registry built from a fixed set of engines.
pub fn registry_of(engines: Vec<Engine>) -> EngineRegistry {
    EngineRegistry::load(engines).expect("valid registry")
}

/// A single-turn greeting request.
pub fn greeting_request() -> InferenceRequest {
    InferenceRequest::builder(RequestId::generate())
        .route_type("chat")
        .task_type("chat_general")
        .message(Message::user("hello there"))
        .build()
        .expect("valid request")
}
