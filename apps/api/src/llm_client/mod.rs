/// Model gateway: the single point of entry for every LLM call in the service.
///
/// ARCHITECTURAL RULE: No agent may talk to a provider directly.
/// All completions go through `ModelGateway`, which owns routing, the one-pass
/// provider fallback and the structured-output contract.
///
/// Failure taxonomy:
///   - transport failure (network, API status, missing key) → next provider
///   - JSON parse failure → one stricter re-prompt on the same provider
///   - both exhausted → `get_completion` errors, `get_structured_completion`
///     returns a schema-shaped default marked `Degraded`
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod prompts;
pub mod providers;
pub mod schema;

pub use providers::{AnthropicProvider, CompletionProvider, CompletionRequest, OpenAiProvider};
pub use schema::{CompletionStatus, DataQuality, OutputSchema, StructuredResponse};

/// Sampling temperature for the first structured attempt.
pub const STRUCTURED_TEMPERATURE: f32 = 0.1;
/// Sampling temperature for the stricter re-prompt.
pub const STRICT_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No API key configured for {0}")]
    MissingCredentials(ProviderKind),

    #[error("Provider {0} is not configured")]
    ProviderUnavailable(ProviderKind),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned JSON that is not an object")]
    NotAnObject,

    #[error("All services failed: {}", .0.join("; "))]
    AllProvidersFailed(Vec<String>),
}

// ────────────────────────────────────────────────────────────────────────────
// Routing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Every kind of completion the agents issue. Used for routing and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    CvAnalysis,
    JobAnalysis,
    JobMatching,
    AtsOptimization,
    CvOptimization,
    LetterWriting,
    ToneAnalysis,
    LetterValidation,
    AtsValidation,
    KeywordValidation,
    ContentValidation,
    CvEvaluation,
    AchievementsEvaluation,
    ExperienceEvaluation,
    SkillsEvaluation,
    IndustryAlignment,
    ContentEvaluation,
    ToneEvaluation,
    CustomizationEvaluation,
    FormatEvaluation,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::CvAnalysis => "cv_analysis",
            TaskType::JobAnalysis => "job_analysis",
            TaskType::JobMatching => "job_matching",
            TaskType::AtsOptimization => "ats_optimization",
            TaskType::CvOptimization => "cv_optimization",
            TaskType::LetterWriting => "letter_writing",
            TaskType::ToneAnalysis => "tone_analysis",
            TaskType::LetterValidation => "letter_validation",
            TaskType::AtsValidation => "ats_validation",
            TaskType::KeywordValidation => "keyword_validation",
            TaskType::ContentValidation => "content_validation",
            TaskType::CvEvaluation => "cv_evaluation",
            TaskType::AchievementsEvaluation => "achievements_evaluation",
            TaskType::ExperienceEvaluation => "experience_evaluation",
            TaskType::SkillsEvaluation => "skills_evaluation",
            TaskType::IndustryAlignment => "industry_alignment",
            TaskType::ContentEvaluation => "content_evaluation",
            TaskType::ToneEvaluation => "tone_evaluation",
            TaskType::CustomizationEvaluation => "customization_evaluation",
            TaskType::FormatEvaluation => "format_evaluation",
        }
    }
}

/// Static task → provider preferences plus the declared fallback order.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    pub default_provider: ProviderKind,
    pub fallback_order: Vec<ProviderKind>,
    pub preferences: HashMap<TaskType, ProviderKind>,
}

impl Default for RoutingTable {
    fn default() -> Self {
        let preferences = HashMap::from([
            (TaskType::CvAnalysis, ProviderKind::Anthropic),
            (TaskType::JobMatching, ProviderKind::OpenAi),
            (TaskType::AtsOptimization, ProviderKind::Anthropic),
        ]);
        Self {
            default_provider: ProviderKind::OpenAi,
            fallback_order: vec![ProviderKind::OpenAi, ProviderKind::Anthropic],
            preferences,
        }
    }
}

impl RoutingTable {
    pub fn preferred(&self, task: Option<TaskType>) -> ProviderKind {
        task.and_then(|t| self.preferences.get(&t).copied())
            .unwrap_or(self.default_provider)
    }

    /// Preferred provider first, then the rest of the fallback order.
    pub fn route(&self, task: Option<TaskType>, preferred: Option<ProviderKind>) -> Vec<ProviderKind> {
        let first = preferred.unwrap_or_else(|| self.preferred(task));
        let mut order = vec![first];
        order.extend(self.fallback_order.iter().copied().filter(|k| *k != first));
        order
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gateway
// ────────────────────────────────────────────────────────────────────────────

/// Uniform completion surface over the configured providers.
pub struct ModelGateway {
    providers: Vec<Arc<dyn CompletionProvider>>,
    routing: RoutingTable,
}

impl ModelGateway {
    pub fn new(providers: Vec<Arc<dyn CompletionProvider>>, routing: RoutingTable) -> Self {
        Self { providers, routing }
    }

    /// Builds both HTTP providers. A missing key does not fail here; the
    /// provider reports `MissingCredentials` on first use.
    pub fn from_config(config: &Config) -> Self {
        let providers: Vec<Arc<dyn CompletionProvider>> = vec![
            Arc::new(OpenAiProvider::new(
                config.openai_api_key.clone(),
                config.openai_model.clone(),
            )),
            Arc::new(AnthropicProvider::new(
                config.anthropic_api_key.clone(),
                config.anthropic_model.clone(),
            )),
        ];
        Self::new(providers, RoutingTable::default())
    }

    fn provider(&self, kind: ProviderKind) -> Option<&Arc<dyn CompletionProvider>> {
        self.providers.iter().find(|p| p.kind() == kind)
    }

    /// Raw text completion with one pass of provider fallback.
    /// Returns `AllProvidersFailed` when every provider fails at transport level.
    pub async fn get_completion(
        &self,
        request: CompletionRequest<'_>,
        task: Option<TaskType>,
        preferred: Option<ProviderKind>,
    ) -> Result<String, LlmError> {
        let mut failures = Vec::new();

        for kind in self.routing.route(task, preferred) {
            let Some(provider) = self.provider(kind) else {
                failures.push(LlmError::ProviderUnavailable(kind).to_string());
                continue;
            };
            match provider.complete(&request).await {
                Ok(text) => {
                    debug!(provider = %kind, task = task.map(TaskType::as_str), "Completion succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(provider = %kind, "Provider call failed, trying next: {e}");
                    failures.push(format!("{kind}: {e}"));
                }
            }
        }

        Err(LlmError::AllProvidersFailed(failures))
    }

    /// Structured completion. Never fails: the worst outcome is a
    /// schema-shaped default with status `Degraded`.
    ///
    /// Per provider in route order:
    ///   1. schema prompt at temperature 0.1
    ///   2. on parse failure, one strict re-prompt at temperature 0.0
    ///   3. second parse failure → degraded default (no further providers)
    ///   4. transport failure at either step → next provider
    pub async fn get_structured_completion(
        &self,
        prompt: &str,
        schema: &OutputSchema,
        task: Option<TaskType>,
        system: Option<&str>,
    ) -> StructuredResponse {
        let task_name = task.map(TaskType::as_str).unwrap_or("general");
        let first_prompt = prompts::schema_prompt(prompt, schema);
        let strict_prompt = prompts::strict_schema_prompt(prompt, schema);
        let first_request = CompletionRequest::new(&first_prompt)
            .with_system(Some(system.unwrap_or(prompts::STRUCTURED_SYSTEM)))
            .with_temperature(STRUCTURED_TEMPERATURE);
        let strict_request = CompletionRequest::new(&strict_prompt)
            .with_system(Some(prompts::STRICT_SYSTEM))
            .with_temperature(STRICT_TEMPERATURE);

        let mut failures = Vec::new();

        for kind in self.routing.route(task, None) {
            let Some(provider) = self.provider(kind) else {
                failures.push(LlmError::ProviderUnavailable(kind).to_string());
                continue;
            };

            let text = match provider.complete(&first_request).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(provider = %kind, task = task_name, "Structured call failed, trying next: {e}");
                    failures.push(format!("{kind}: {e}"));
                    continue;
                }
            };

            let parse_error = match parse_object(&text) {
                Ok(object) => return self.shape(object, schema, kind, task_name),
                Err(e) => e,
            };
            warn!(provider = %kind, task = task_name, "Unparseable structured response ({parse_error}), re-prompting");

            let text = match provider.complete(&strict_request).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(provider = %kind, task = task_name, "Strict re-prompt failed, trying next: {e}");
                    failures.push(format!("{kind}: {e}"));
                    continue;
                }
            };

            return match parse_object(&text) {
                Ok(object) => self.shape(object, schema, kind, task_name),
                Err(e) => {
                    warn!(provider = %kind, task = task_name, "Strict re-prompt unparseable, using defaults: {e}");
                    StructuredResponse::degraded(schema, format!("{kind}: {e}"))
                }
            };
        }

        let reason = LlmError::AllProvidersFailed(failures).to_string();
        warn!(task = task_name, "{reason}; using defaults");
        StructuredResponse::degraded(schema, reason)
    }

    fn shape(
        &self,
        object: Map<String, Value>,
        schema: &OutputSchema,
        kind: ProviderKind,
        task_name: &str,
    ) -> StructuredResponse {
        let response = StructuredResponse::from_object(object, schema);
        if let CompletionStatus::Patched { missing } = &response.status {
            info!(provider = %kind, task = task_name, ?missing, "Injected defaults for missing fields");
        }
        response
    }
}

/// Strips fences and parses the text as a JSON object.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, LlmError> {
    match serde_json::from_str::<Value>(strip_json_fences(text))? {
        Value::Object(map) => Ok(map),
        _ => Err(LlmError::NotAnObject),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// In-memory providers for tests across the crate.
#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub prompt: String,
        pub temperature: Option<f32>,
    }

    type Responder = Box<dyn Fn(&CompletionRequest<'_>) -> Result<String, LlmError> + Send + Sync>;

    enum Script {
        Responder(Responder),
        Queue(Mutex<VecDeque<Result<String, LlmError>>>),
    }

    pub struct ScriptedProvider {
        kind: ProviderKind,
        script: Script,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedProvider {
        /// Answers every call through `responder`.
        pub fn new(
            kind: ProviderKind,
            responder: impl Fn(&CompletionRequest<'_>) -> Result<String, LlmError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                kind,
                script: Script::Responder(Box::new(responder)),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Answers calls in order; an exhausted queue fails at transport level.
        pub fn sequence(kind: ProviderKind, replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                kind,
                script: Script::Queue(Mutex::new(replies.into())),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(RecordedCall {
                prompt: request.prompt.to_string(),
                temperature: request.temperature,
            });
            match &self.script {
                Script::Responder(f) => f(request),
                Script::Queue(queue) => queue
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(Err(LlmError::ProviderUnavailable(self.kind))),
            }
        }
    }

    /// Gateway over a single scripted OpenAI-kind provider. Tasks routed to
    /// Anthropic fall through to it because Anthropic is not configured.
    pub fn gateway_with(
        responder: impl Fn(&CompletionRequest<'_>) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Arc<ModelGateway> {
        let provider: Arc<dyn CompletionProvider> =
            Arc::new(ScriptedProvider::new(ProviderKind::OpenAi, responder));
        Arc::new(ModelGateway::new(vec![provider], RoutingTable::default()))
    }

    /// Gateway whose every call fails at transport level.
    pub fn failing_gateway() -> Arc<ModelGateway> {
        gateway_with(|_| Err(LlmError::EmptyContent))
    }
}
