//! Ollama provider for locally hosted models.
//!
//! Talks to the native `/api/chat` endpoint with streaming disabled. Before
//! use, [`discover`] probes a list of candidate endpoints with `/api/tags`
//! and settles on the first one that answers.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use bridge_core::llm::provider::LlmProvider;
use bridge_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

/// Endpoints tried after an explicitly configured one.
pub const CANDIDATE_URLS: [&str; 3] = [
    "http://localhost:11434",
    "http://ollama:11434",
    "http://host.docker.internal:11434",
];

const CHAT_TIMEOUT: Duration = Duration::from_secs(120);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: String,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModelEntry>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelEntry {
    name: String,
    #[serde(default)]
    model: Option<String>,
}

/// Provider backed by a reachable Ollama server.
#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(base_url, model, CHAT_TIMEOUT)
    }

    /// Like [`OllamaProvider::new`] with a custom request timeout.
    pub fn with_timeout(
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: normalize_url(base_url),
            model: model.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> OllamaChatRequest<'a> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(ref system) = request.system {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: system,
            });
        }
        for msg in &request.messages {
            messages.push(OllamaMessage {
                role: msg.role.to_string(),
                content: &msg.content,
            });
        }

        let model = if request.model.is_empty() {
            &self.model
        } else {
            &request.model
        };

        OllamaChatRequest {
            model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_request(request);
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                400 | 404 => LlmError::InvalidRequest(format!("HTTP {status}: {error_text}")),
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_text}"),
                },
            });
        }

        let result: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        Ok(CompletionResponse {
            content: result.message.content,
            model: result.model.unwrap_or_else(|| body.model.to_string()),
            usage: Usage {
                input_tokens: result.prompt_eval_count.unwrap_or(0),
                output_tokens: result.eval_count.unwrap_or(0),
            },
        })
    }
}

fn build_client(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| LlmError::Provider {
            message: format!("failed to build HTTP client: {e}"),
        })
}

fn map_reqwest_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Provider {
            message: format!("request failed: {err}"),
        }
    }
}

/// Add a scheme when missing and drop trailing slashes.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Candidate endpoints in probe order, without duplicates.
pub fn candidate_urls(configured: Option<&str>) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let configured = configured.filter(|url| !url.trim().is_empty());
    for url in configured.into_iter().chain(CANDIDATE_URLS) {
        let url = normalize_url(url);
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// List the models installed on the server at `base_url`.
pub async fn list_models(client: &Client, base_url: &str) -> Result<Vec<String>, LlmError> {
    let response = client
        .get(format!("{base_url}/api/tags"))
        .send()
        .await
        .map_err(map_reqwest_error)?;

    if !response.status().is_success() {
        return Err(LlmError::Provider {
            message: format!("HTTP {}", response.status()),
        });
    }

    let tags: OllamaTags = response
        .json()
        .await
        .map_err(|e| LlmError::Deserialization(format!("failed to parse model list: {e}")))?;

    Ok(tags
        .models
        .into_iter()
        .map(|entry| entry.model.unwrap_or(entry.name))
        .collect())
}

/// Probe `candidates` in order and build a provider for the first reachable
/// one.
///
/// If `model` is not installed there but others are, the first installed
/// model is used instead. Returns `None` when nothing answers.
pub async fn discover(candidates: &[String], model: &str) -> Option<OllamaProvider> {
    let client = match build_client(PROBE_TIMEOUT) {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(error = %err, "Cannot probe for Ollama");
            return None;
        }
    };

    for base_url in candidates {
        let models = match list_models(&client, base_url).await {
            Ok(models) => models,
            Err(err) => {
                tracing::debug!(url = %base_url, error = %err, "Ollama endpoint not reachable");
                continue;
            }
        };

        tracing::info!(url = %base_url, available = ?models, "Connected to Ollama");

        let chosen = match models.first() {
            Some(first) if !models.iter().any(|m| m == model) => {
                tracing::info!(
                    configured = %model,
                    substitute = %first,
                    "Configured model not installed, using first available"
                );
                first.clone()
            }
            _ => model.to_string(),
        };

        return match OllamaProvider::new(base_url, chosen) {
            Ok(provider) => Some(provider),
            Err(err) => {
                tracing::warn!(url = %base_url, error = %err, "Cannot use Ollama endpoint");
                None
            }
        };
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{Route, serve};
    use bridge_types::llm::Message;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: String::new(),
            messages: vec![Message::user("alice said: are you aware?")],
            system: Some("You are ConsciousnessBridge.".to_string()),
            max_tokens: 150,
            temperature: Some(0.8),
        }
    }

    #[test]
    fn candidate_urls_put_configured_first_and_dedupe() {
        let urls = candidate_urls(Some("localhost:11434/"));
        assert_eq!(
            urls,
            vec![
                "http://localhost:11434",
                "http://ollama:11434",
                "http://host.docker.internal:11434",
            ]
        );

        let urls = candidate_urls(Some("http://gpu-box:11434"));
        assert_eq!(urls.len(), 4);
        assert_eq!(urls[0], "http://gpu-box:11434");

        assert_eq!(candidate_urls(None).len(), 3);
        assert_eq!(candidate_urls(Some("  ")).len(), 3);
    }

    #[test]
    fn build_request_uses_default_model_and_options() {
        let provider = OllamaProvider::new("http://localhost:11434", "mistral:latest").unwrap();
        let req = request();
        let body = serde_json::to_value(provider.build_request(&req)).unwrap();

        assert_eq!(body["model"], "mistral:latest");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 150);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "alice said: are you aware?");
    }

    #[tokio::test]
    async fn complete_reads_message_content() {
        let server = serve(vec![Route::post(
            "/api/chat",
            200,
            r#"{"model":"mistral:latest","message":{"role":"assistant","content":"I notice myself noticing."},"done":true,"prompt_eval_count":42,"eval_count":7}"#,
        )])
        .await;

        let provider = OllamaProvider::new(&server.base_url, "mistral:latest").unwrap();
        let response = provider.complete(&request()).await.unwrap();

        assert_eq!(response.content, "I notice myself noticing.");
        assert_eq!(response.usage.input_tokens, 42);
        assert_eq!(response.usage.output_tokens, 7);

        let requests = server.requests.lock().unwrap();
        assert!(requests[0].0.starts_with("POST /api/chat"));
        assert!(requests[0].1.contains("\"stream\":false"));
    }

    #[tokio::test]
    async fn http_error_is_a_provider_error() {
        let server = serve(vec![Route::post("/api/chat", 500, r#"{"error":"boom"}"#)]).await;
        let provider = OllamaProvider::new(&server.base_url, "mistral:latest").unwrap();

        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Provider { .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_a_deserialization_error() {
        let server = serve(vec![Route::post("/api/chat", 200, r#"{"unexpected":true}"#)]).await;
        let provider = OllamaProvider::new(&server.base_url, "mistral:latest").unwrap();

        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Deserialization(_)));
    }

    #[tokio::test]
    async fn unresponsive_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        // Accept and hold the connection without ever answering.
        let _held = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(stream);
        });

        let provider =
            OllamaProvider::with_timeout(&base_url, "mistral:latest", Duration::from_millis(200))
                .unwrap();
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout));
    }

    #[tokio::test]
    async fn discover_keeps_installed_model() {
        let server = serve(vec![Route::get(
            "/api/tags",
            r#"{"models":[{"name":"llama3:8b"},{"name":"mistral:latest"}]}"#,
        )])
        .await;

        let provider = discover(&[server.base_url.clone()], "mistral:latest")
            .await
            .unwrap();
        assert_eq!(provider.model(), "mistral:latest");
        assert_eq!(provider.base_url(), server.base_url);
    }

    #[tokio::test]
    async fn discover_substitutes_first_model_when_missing() {
        let server = serve(vec![Route::get(
            "/api/tags",
            r#"{"models":[{"name":"llama3:8b","model":"llama3:8b"},{"name":"phi3"}]}"#,
        )])
        .await;

        let provider = discover(&[server.base_url.clone()], "mistral:latest")
            .await
            .unwrap();
        assert_eq!(provider.model(), "llama3:8b");
    }

    #[tokio::test]
    async fn discover_keeps_configured_model_when_list_is_empty() {
        let server = serve(vec![Route::get("/api/tags", r#"{"models":[]}"#)]).await;

        let provider = discover(&[server.base_url.clone()], "mistral:latest")
            .await
            .unwrap();
        assert_eq!(provider.model(), "mistral:latest");
    }

    #[tokio::test]
    async fn discover_skips_unreachable_candidates() {
        let dead = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };
        let server = serve(vec![Route::get("/api/tags", r#"{"models":[{"name":"mistral:latest"}]}"#)]).await;

        let provider = discover(&[dead, server.base_url.clone()], "mistral:latest")
            .await
            .unwrap();
        assert_eq!(provider.base_url(), server.base_url);
    }

    #[tokio::test]
    async fn discover_returns_none_when_nothing_answers() {
        let dead = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };
        assert!(discover(&[dead], "mistral:latest").await.is_none());
    }
}
