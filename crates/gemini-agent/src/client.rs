use crate::error::GeminiError;
use crate::prompts;
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part, ThinkingConfig,
};
use crate::Result;
use base64::Engine;
use chrono::NaiveDate;
use nexus_core::config::AiConfig;
use nexus_core::plan::{PlanResponse, RiskResponse};
use nexus_core::project::Project;
use nexus_core::team::TeamMember;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";
const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// What a plan is generated from.
#[derive(Debug, Clone)]
pub enum PlanInput {
    Text(String),
    Audio { data: Vec<u8>, mime_type: Option<String> },
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    fast_model: String,
    pro_model: String,
    thinking_budget: u32,
}

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

impl GeminiClient {
    pub fn new(config: &AiConfig, api_key: impl Into<String>) -> Self {
        GeminiClient {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            fast_model: config.fast_model.clone(),
            pro_model: config.pro_model.clone(),
            thinking_budget: config.thinking_budget,
        }
    }

    /// Build a client with the key read from the environment variable named
    /// by `config.api_key_env`.
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(config, key.trim())),
            _ => Err(GeminiError::MissingApiKey(config.api_key_env.clone())),
        }
    }

    fn thinking(&self) -> Option<ThinkingConfig> {
        (self.thinking_budget > 0).then_some(ThinkingConfig {
            thinking_budget: self.thinking_budget,
        })
    }

    async fn generate(&self, model: &str, request: &GenerateContentRequest) -> Result<String> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);
        debug!(model, "generateContent request");
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        parsed
            .text()
            .ok_or_else(|| GeminiError::Empty(parsed.empty_reason()))
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<T> {
        let text = self.generate(&self.pro_model, request).await?;
        serde_json::from_str(strip_fences(&text)).map_err(|source| GeminiError::Parse {
            output: text.clone(),
            source,
        })
    }

    /// Speech to text with the fast model. Empty output is an empty string.
    pub async fn transcribe(&self, audio: &[u8], mime_type: &str, language: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline(mime_type, encode(audio)),
                Part::text(prompts::transcribe(language)),
            ])],
            ..Default::default()
        };
        match self.generate(&self.fast_model, &request).await {
            Err(GeminiError::Empty(_)) => Ok(String::new()),
            other => other,
        }
    }

    /// Grammar and clarity pass. Any failure returns `text` unchanged.
    pub async fn refine_text(&self, text: &str) -> String {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompts::refine(text))])],
            ..Default::default()
        };
        match self.generate(&self.fast_model, &request).await {
            Ok(refined) => refined,
            Err(e) => {
                warn!("refinement failed, keeping original text: {e}");
                text.to_string()
            }
        }
    }

    pub async fn parse_plan(
        &self,
        input: PlanInput,
        team: &[TeamMember],
        today: NaiveDate,
    ) -> Result<PlanResponse> {
        let parts = match input {
            PlanInput::Text(text) => vec![Part::text(text)],
            PlanInput::Audio { data, mime_type } => vec![
                Part::inline(
                    mime_type.unwrap_or_else(|| DEFAULT_AUDIO_MIME.to_string()),
                    encode(&data),
                ),
                Part::text(prompts::PLAN_FROM_AUDIO),
            ],
        };
        let request = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: Some(Content::system(prompts::plan_system(today, team))),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(prompts::plan_schema()),
                thinking_config: self.thinking(),
            }),
        };
        self.generate_json(&request).await
    }

    pub async fn analyze_risks(&self, project: &Project) -> Result<Vec<RiskResponse>> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompts::risks(project))])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(prompts::risk_schema()),
                thinking_config: self.thinking(),
            }),
        };
        self.generate_json(&request).await
    }

    /// Markdown status report.
    pub async fn generate_report(&self, project: &Project) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompts::report(project))])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                thinking_config: self.thinking(),
                ..Default::default()
            }),
        };
        self.generate(&self.pro_model, &request).await
    }
}

/// Drop a surrounding ```json fence if the model added one.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_code_fences() {
        assert_eq!(strip_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_fences("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn missing_key_names_the_variable() {
        let config = AiConfig {
            api_key_env: "NEXUS_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        let err = GeminiClient::from_config(&config).unwrap_err();
        assert!(matches!(err, GeminiError::MissingApiKey(ref v) if v == "NEXUS_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn zero_budget_disables_thinking() {
        let config = AiConfig {
            thinking_budget: 0,
            ..Default::default()
        };
        assert!(GeminiClient::new(&config, "k").thinking().is_none());
    }
}
