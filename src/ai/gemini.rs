use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::GenerativeModel;
use super::AiError;
use crate::config::Settings;
use crate::index::{EmbeddingModel, IndexError};

/// Output width of the text-embedding-004 model.
pub const EMBEDDING_DIM: usize = 768;

/// HTTP client for the Gemini generateContent / embedContent API family.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        embedding_model: &str,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            embedding_model: embedding_model.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Build a client from settings; fails when no API key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self, AiError> {
        let api_key = settings.model_api_key.as_deref().ok_or(AiError::MissingApiKey)?;
        Ok(Self::new(
            &settings.model_base_url,
            api_key,
            &settings.model_name,
            &settings.embedding_model,
            settings.unit_timeout_secs,
        ))
    }

    fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, AiError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    AiError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    AiError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
                } else {
                    AiError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .map_err(|e| AiError::ResponseParsing(e.to_string()))
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let url = format!(
            "{}/models/{}:embedContent",
            self.base_url, self.embedding_model
        );
        let body = EmbedContentRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let parsed: EmbedContentResponse = self.post_json(&url, &body)?;
        Ok(parsed.embedding.values)
    }
}

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GenerativeModel for GeminiClient {
    fn generate(
        &self,
        system: Option<&str>,
        prompt: &str,
        json_output: bool,
    ) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: system.map(|text| Content {
                parts: vec![Part { text }],
            }),
            generation_config: json_output.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        let parsed: GenerateContentResponse = self.post_json(&url, &body)?;
        let candidate = parsed.candidates.into_iter().next().ok_or(AiError::EmptyResponse)?;
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }
}

impl EmbeddingModel for GeminiClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        self.embed_text(text)
            .map_err(|e| IndexError::Embedding(e.to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

// ═══════════════════════════════════════════════════════════
// Mock model
// ═══════════════════════════════════════════════════════════

enum MockBehavior {
    Respond(String),
    Fail(String),
    Hang(Duration),
}

struct MockRule {
    needle: String,
    behavior: MockBehavior,
}

/// Mock generative model for testing. Returns a configurable default
/// response, with per-call overrides keyed on prompt content.
pub struct MockModel {
    default_response: String,
    rules: Vec<MockRule>,
}

impl MockModel {
    pub fn new(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            rules: Vec::new(),
        }
    }

    /// When the prompt contains `needle`, answer with `response` instead.
    pub fn respond_when(mut self, needle: &str, response: &str) -> Self {
        self.rules.push(MockRule {
            needle: needle.to_string(),
            behavior: MockBehavior::Respond(response.to_string()),
        });
        self
    }

    /// When the prompt contains `needle`, fail the call.
    pub fn fail_when(mut self, needle: &str, message: &str) -> Self {
        self.rules.push(MockRule {
            needle: needle.to_string(),
            behavior: MockBehavior::Fail(message.to_string()),
        });
        self
    }

    /// When the prompt contains `needle`, block for `delay` before answering.
    pub fn hang_when(mut self, needle: &str, delay: Duration) -> Self {
        self.rules.push(MockRule {
            needle: needle.to_string(),
            behavior: MockBehavior::Hang(delay),
        });
        self
    }
}

impl GenerativeModel for MockModel {
    fn generate(
        &self,
        _system: Option<&str>,
        prompt: &str,
        _json_output: bool,
    ) -> Result<String, AiError> {
        for rule in &self.rules {
            if prompt.contains(&rule.needle) {
                match &rule.behavior {
                    MockBehavior::Respond(response) => return Ok(response.clone()),
                    MockBehavior::Fail(message) => {
                        return Err(AiError::HttpClient(message.clone()))
                    }
                    MockBehavior::Hang(delay) => {
                        std::thread::sleep(*delay);
                        return Ok(self.default_response.clone());
                    }
                }
            }
        }
        Ok(self.default_response.clone())
    }
}
