#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::GenerationError;
use crate::domain::models::GenerationRequest;
use crate::domain::models::GenerationResponse;
use crate::domain::models::GroundingChunk;
use crate::domain::models::PromptPart;

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const SAFETY_FINISH_REASONS: [&str; 4] = ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPartsBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ContentParts {
    Text(String),
    InlineData(ContentPartsBlob),
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentParts>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GoogleSearch {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

impl GenerateContentRequest {
    fn from_request(request: &GenerationRequest) -> GenerateContentRequest {
        let parts = request
            .prompt
            .parts()
            .into_iter()
            .map(|part| {
                match part {
                    PromptPart::Text(text) => return ContentParts::Text(text),
                    PromptPart::InlineImage { mime_type, data } => {
                        return ContentParts::InlineData(ContentPartsBlob { mime_type, data });
                    }
                }
            })
            .collect();

        let system_instruction = request.system_instruction.as_ref().map(|text| {
            return Content {
                role: None,
                parts: vec![ContentParts::Text(text.to_string())],
            };
        });

        let mut thinking_config = None;
        if request.disables_thinking() {
            thinking_config = Some(ThinkingConfig { thinking_budget: 0 });
        }

        let mut tools = None;
        if request.use_retrieval {
            tools = Some(vec![Tool {
                google_search: GoogleSearch {},
            }]);
        }

        return GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                thinking_config,
            },
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|category| {
                    return SafetySetting {
                        category: category.to_string(),
                        threshold: "BLOCK_NONE".to_string(),
                    };
                })
                .collect(),
            tools,
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Chunk {
    web: Option<WebChunk>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<Chunk>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    fn into_generation(self) -> Result<GenerationResponse, GenerationError> {
        if let Some(reason) = self.prompt_feedback.and_then(|e| return e.block_reason) {
            return Err(GenerationError::Safety(reason));
        }

        let candidate = match self.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => return Ok(GenerationResponse::default()),
        };

        let text = candidate
            .content
            .unwrap_or_default()
            .parts
            .into_iter()
            .filter(|e| return !e.thought)
            .filter_map(|e| return e.text)
            .collect::<String>();

        if text.is_empty() {
            if let Some(reason) = candidate.finish_reason {
                if SAFETY_FINISH_REASONS.contains(&reason.as_str()) {
                    return Err(GenerationError::Safety(reason));
                }
            }
            return Ok(GenerationResponse::default());
        }

        let grounding_chunks = candidate.grounding_metadata.map(|metadata| {
            return metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|e| return e.web)
                .map(|web| {
                    return GroundingChunk {
                        uri: web.uri.unwrap_or_default(),
                        title: web.title.unwrap_or_default(),
                    };
                })
                .collect::<Vec<_>>();
        });

        return Ok(GenerationResponse {
            text: Some(text),
            grounding_chunks,
        });
    }
}

fn classify_status(status: u16, body: &str) -> GenerationError {
    let message = format!("Gemini responded with {status}: {}", body.trim());
    if status == 401 || status == 403 || (status == 400 && body.contains("API key")) {
        return GenerationError::Auth(message);
    }

    return GenerationError::Unknown(message);
}

pub struct Gemini {
    url: String,
    token: String,
    timeout: String,
}

impl Default for Gemini {
    fn default() -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::GeminiURL),
            token: Config::get(ConfigKey::GeminiToken),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for Gemini {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Gemini URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Gemini token is not defined");
        }

        let url = format!(
            "{url}/v1beta/models?key={key}",
            url = self.url,
            key = self.token
        );

        let res = reqwest::Client::new()
            .get(&url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Gemini is not reachable");
                bail!("Gemini is not reachable");
            }
        };

        let status = res.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Gemini health check failed");
            bail!("Gemini health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        if self.token.is_empty() {
            return Err(GenerationError::Auth(
                "Gemini token is not defined".to_string(),
            ));
        }

        let req = GenerateContentRequest::from_request(request);
        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/models/{model}:generateContent?key={key}",
                url = self.url,
                model = request.backend_model_id,
                key = self.token,
            ))
            .json(&req)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                model = request.backend_model_id.as_str(),
                "Failed to make generation request to Gemini"
            );
            return Err(classify_status(status.as_u16(), &body));
        }

        let body = res.text().await?;
        let parsed = serde_json::from_str::<GenerateContentResponse>(&body)
            .map_err(|err| return GenerationError::MalformedResponse(err.to_string()))?;

        return parsed.into_generation();
    }
}
