//! LLM Client: unified interface for Ollama and OpenAI-compatible backends.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Pause before retry `n` (1-based) is `n × RETRY_BACKOFF_MS`.
const RETRY_BACKOFF_MS: u64 = 250;

/// Provider backend for LLM inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    /// Ollama running locally (recommended).
    Ollama { base_url: String },
    /// OpenAI-compatible API.
    OpenAiCompatible { base_url: String, api_key: String },
    /// No LLM available: all calls return error, the corpus reply stands.
    None,
}

impl LlmProvider {
    /// Resolve a provider from its configured name.
    ///
    /// `api_key` is only consulted for `"openai"`.
    ///
    /// # Errors
    /// Returns `LlmError::ConfigError` for an unknown name or a missing key.
    pub fn from_name(
        name: &str,
        base_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, LlmError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        match name.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama { base_url }),
            "openai" | "openai_compatible" => {
                let api_key = api_key.ok_or_else(|| {
                    LlmError::ConfigError("openai provider needs an API key".into())
                })?;
                Ok(Self::OpenAiCompatible { base_url, api_key })
            }
            "none" | "" => Ok(Self::None),
            other => Err(LlmError::ConfigError(format!("unknown provider '{other}'"))),
        }
    }
}

/// The LLM client that routes requests to the configured backend.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
        }
    }

    /// Create a client with no LLM backend.
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// Model requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Configured backend.
    #[must_use]
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Check if the LLM client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Confirm the backend answers and, for Ollama, that the model is pulled.
    ///
    /// # Errors
    /// `Unavailable` if the server cannot be reached, `Timeout` if it is too
    /// slow, `ModelMissing` if Ollama does not list the model.
    pub async fn health_check(&self, timeout_ms: u64) -> Result<(), LlmError> {
        let timeout = Duration::from_millis(timeout_ms);
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => {
                let resp = self
                    .http
                    .get(format!("{base_url}/api/tags"))
                    .timeout(timeout)
                    .send()
                    .await
                    .map_err(|e| with_timeout(e.into(), timeout_ms))?;
                if !resp.status().is_success() {
                    return Err(LlmError::Unavailable(format!(
                        "Ollama API returned status {}",
                        resp.status()
                    )));
                }
                let tags: Value = resp
                    .json()
                    .await
                    .map_err(|e| LlmError::ParseError(e.to_string()))?;
                let available = model_names(&tags);
                if model_listed(&available, &self.model) {
                    debug!(model = %self.model, "Ollama model available");
                    Ok(())
                } else {
                    Err(LlmError::ModelMissing {
                        model: self.model.clone(),
                        available,
                    })
                }
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let resp = self
                    .http
                    .get(format!("{base_url}/v1/models"))
                    .bearer_auth(api_key)
                    .timeout(timeout)
                    .send()
                    .await
                    .map_err(|e| with_timeout(e.into(), timeout_ms))?;
                if resp.status().is_success() {
                    Ok(())
                } else {
                    Err(LlmError::Unavailable(format!(
                        "OpenAI API returned status {}",
                        resp.status()
                    )))
                }
            }
        }
    }

    /// Generate a response from the LLM.
    ///
    /// Returns `Err` if the LLM is unavailable, all retries fail, or the
    /// completion is empty. The caller should keep the corpus reply on error.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => {
                let url = format!("{base_url}/api/generate");
                let body = json!({
                    "model": self.model,
                    "system": request.system,
                    "prompt": request.user,
                    "stream": false,
                    "options": {
                        "temperature": request.temperature,
                        "top_p": 0.9,
                        "top_k": 40,
                        "num_predict": request.max_tokens,
                        "stop": request.stop,
                    }
                });
                let (json, latency_ms) = self.post_with_retries(&url, &body, None, request).await?;
                let text = json["response"].as_str().unwrap_or_default();
                let tokens = json["eval_count"].as_u64().unwrap_or(0);
                self.finish(text, tokens, latency_ms)
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let url = format!("{base_url}/v1/chat/completions");
                let body = json!({
                    "model": self.model,
                    "messages": [
                        { "role": "system", "content": request.system },
                        { "role": "user", "content": request.user },
                    ],
                    "max_tokens": request.max_tokens,
                    "temperature": request.temperature,
                    "stop": request.stop,
                });
                let (json, latency_ms) = self
                    .post_with_retries(&url, &body, Some(api_key), request)
                    .await?;
                let text = json["choices"][0]["message"]["content"]
                    .as_str()
                    .unwrap_or_default();
                let tokens = json["usage"]["completion_tokens"].as_u64().unwrap_or(0);
                self.finish(text, tokens, latency_ms)
            }
        }
    }

    /// POST `body` up to `max_retries + 1` times; returns the decoded JSON of
    /// the first successful attempt and its latency.
    async fn post_with_retries(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
        request: &LlmRequest,
    ) -> Result<(Value, u64), LlmError> {
        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt = attempt + 1, of = self.max_retries + 1, "retrying LLM call");
                tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt)))
                    .await;
            }

            let mut builder = self
                .http
                .post(url)
                .json(body)
                .timeout(Duration::from_millis(request.timeout_ms));
            if let Some(key) = bearer {
                builder = builder.bearer_auth(key);
            }

            let start = Instant::now();
            let result = builder.send().await;
            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let json: Value = resp
                        .json()
                        .await
                        .map_err(|e| LlmError::ParseError(e.to_string()))?;
                    return Ok((json, latency_ms));
                }
                Ok(resp) => {
                    let status = resp.status();
                    last_error = format!("HTTP {status}: {}", resp.text().await.unwrap_or_default());
                    warn!(%status, url, "LLM backend returned error");
                }
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() {
                        warn!(timeout_ms = request.timeout_ms, url, "LLM request timed out");
                    } else if e.is_connect() {
                        // Nothing listening; further attempts will not help.
                        return Err(LlmError::Unavailable(last_error));
                    } else {
                        warn!(error = %last_error, url, "LLM request failed");
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }

    fn finish(&self, text: &str, tokens: u64, latency_ms: u64) -> Result<LlmResponse, LlmError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(LlmResponse {
            text: text.to_string(),
            tokens_generated: u32::try_from(tokens).unwrap_or(u32::MAX),
            latency_ms,
            model: self.model.clone(),
        })
    }
}

fn with_timeout(err: LlmError, timeout_ms: u64) -> LlmError {
    match err {
        LlmError::Timeout(_) => LlmError::Timeout(timeout_ms),
        other => other,
    }
}

/// Model names listed in an Ollama `/api/tags` body.
fn model_names(tags: &Value) -> Vec<String> {
    tags["models"]
        .as_array()
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m["name"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Whether `wanted` is installed. An untagged name matches its `:latest` tag.
#[must_use]
pub fn model_listed(available: &[String], wanted: &str) -> bool {
    available.iter().any(|name| {
        name == wanted || (!wanted.contains(':') && name.strip_suffix(":latest") == Some(wanted))
    })
}
