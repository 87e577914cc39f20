//! Mock providers shared by the crate's tests.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bridge_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use super::provider::LlmProvider;

#[derive(Clone)]
pub(crate) enum MockResult {
    Reply(String),
    Fail(String),
}

pub(crate) struct MockProvider {
    name: String,
    result: MockResult,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl MockProvider {
    pub(crate) fn ok(name: &str, reply: &str) -> Self {
        Self::with_result(name, MockResult::Reply(reply.to_string()))
    }

    pub(crate) fn failing(name: &str, message: &str) -> Self {
        Self::with_result(name, MockResult::Fail(message.to_string()))
    }

    fn with_result(name: &str, result: MockResult) -> Self {
        Self {
            name: name.to_string(),
            result,
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle to the call counter, usable after the provider is boxed.
    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub(crate) fn last_request(&self) -> Arc<Mutex<Option<CompletionRequest>>> {
        Arc::clone(&self.last_request)
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        let result = self.result.clone();
        async move {
            match result {
                MockResult::Reply(content) => Ok(CompletionResponse {
                    content,
                    model: "mock-model".to_string(),
                    usage: Usage::default(),
                }),
                MockResult::Fail(message) => Err(LlmError::Provider { message }),
            }
        }
    }
}
