//! Generative delegation: turn the matched shortlist into a prompt and let
//! the model write the reply. Any failure keeps the corpus reply.

use pedant_core::CorpusIndex;
use pedant_core::config::LlmConfig;
use pedant_core::template::{TemplateContext, render};
use pedant_llm::{CandidateSnippet, LlmClient, LlmError, LlmProvider, LlmRequest, PersonaPrompt};
use tracing::{debug, warn};

use crate::session::{Reply, ReplySource};

/// Routes turns through an [`LlmClient`] in character.
pub struct Delegate {
    client: LlmClient,
    persona_name: String,
    profile: Option<String>,
    temperature: f32,
    max_tokens: u32,
    request_timeout_ms: u64,
    health_timeout_ms: u64,
    context_candidates: usize,
}

impl Delegate {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(
        client: LlmClient,
        persona_name: impl Into<String>,
        profile: Option<String>,
        config: &LlmConfig,
    ) -> Self {
        Self {
            client,
            persona_name: persona_name.into(),
            profile,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            request_timeout_ms: config.request_timeout_ms,
            health_timeout_ms: config.health_timeout_ms,
            context_candidates: config.context_candidates,
        }
    }

    /// Build the client described by `[llm]`. The API key, when the provider
    /// needs one, is read from the variable named by `api_key_env`.
    ///
    /// # Errors
    /// `LlmError::ConfigError` for an unknown provider or a missing key.
    pub fn from_config(
        config: &LlmConfig,
        persona_name: &str,
        profile: Option<String>,
    ) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        let provider = LlmProvider::from_name(&config.provider, &config.base_url, api_key)?;
        let client = LlmClient::new(provider, config.model.clone(), config.max_retries);
        Ok(Self::new(client, persona_name, profile, config))
    }

    /// The underlying client.
    #[must_use]
    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    /// Check the backend before the first turn.
    ///
    /// # Errors
    /// Whatever the health check reports.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        self.client.health_check(self.health_timeout_ms).await
    }

    /// The prompt that would be sent for `reply`.
    ///
    /// Context comes from the shortlist behind the reply, best first; a
    /// fallback reply has none.
    #[must_use]
    pub fn prompt_for(&self, utterance: &str, reply: &Reply, index: &CorpusIndex) -> PersonaPrompt {
        let ctx = TemplateContext::from_utterance(utterance);
        let snippets: Vec<CandidateSnippet> = reply
            .shortlist
            .iter()
            .filter_map(|candidate| index.get(candidate.id.as_str()))
            .map(|record| CandidateSnippet {
                body: render(&record.body, &ctx),
                category: record.category.as_str().to_string(),
                keywords: record.keywords.clone(),
            })
            .collect();
        PersonaPrompt::build(
            &self.persona_name,
            self.profile.as_deref(),
            utterance,
            &snippets,
            reply.intensity.value(),
            self.context_candidates,
        )
    }

    /// Replace `reply` with a generated one, or return it unchanged if the
    /// backend fails. Generated replies never carry a follow-up.
    pub async fn enhance(&self, utterance: &str, reply: Reply, index: &CorpusIndex) -> Reply {
        let prompt = self.prompt_for(utterance, &reply, index);
        let request = LlmRequest::new(prompt.system, prompt.user)
            .with_sampling(self.temperature, self.max_tokens)
            .with_timeout(self.request_timeout_ms);

        match self.client.generate(&request).await {
            Ok(response) => {
                debug!(
                    model = %response.model,
                    latency_ms = response.latency_ms,
                    tokens = response.tokens_generated,
                    "generated reply"
                );
                Reply {
                    text: response.text,
                    follow_up: None,
                    source: ReplySource::Generated {
                        model: response.model,
                    },
                    ..reply
                }
            }
            Err(e) => {
                warn!(error = %e, "generation failed, keeping corpus reply");
                reply
            }
        }
    }
}
