//! Gemini Model Provider
//!
//! Implementation of `ModelProvider` for the Gemini `generateContent` REST
//! API. Maps orchestrator turns onto wire contents (inline attachment data
//! before the accompanying text, function calls, function responses), the
//! declared tool set onto function declarations, and grounding metadata back
//! onto citations.

use std::collections::HashMap;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    provider::{ModelProvider, ModelTurn},
    tool::{ToolCall, ToolDeclaration},
    turn::{Citation, Turn},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key (configuration-class failure when absent)
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Sampling temperature. Low by default: the advisor should be factual.
    pub temperature: f32,

    /// Per-call timeout at the transport boundary
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-3-pro-preview".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            temperature: 0.1,
            timeout_secs: 60,
        }
    }
}

impl GeminiConfig {
    /// Read configuration from the environment (`GEMINI_API_KEY`,
    /// optionally `GEMINI_MODEL`)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Auth("GEMINI_API_KEY is not set".into()))?;

        let mut config = Self { api_key, ..Self::default() };
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        Ok(config)
    }
}

/// Gemini REST provider
pub struct GeminiProvider {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create from configuration
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AgentError::Auth("Gemini API key is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(GeminiConfig::from_env()?)
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    /// Convert orchestrator turns to wire contents
    fn convert_history(history: &[Turn]) -> Vec<Content> {
        history
            .iter()
            .map(|turn| match turn {
                Turn::User { text, attachment } => {
                    let mut parts = Vec::new();
                    // Attachment data goes first so the model sees it before
                    // the accompanying message.
                    if let Some(att) = attachment {
                        parts.push(Part {
                            inline_data: Some(InlineData {
                                mime_type: att.media_type.clone(),
                                data: att.encoded_data.clone(),
                            }),
                            ..Part::default()
                        });
                    }
                    parts.push(Part::text(text));
                    Content { role: "user".into(), parts }
                }
                Turn::Assistant { text, .. } => Content {
                    role: "model".into(),
                    parts: vec![Part::text(text)],
                },
                Turn::ToolRequest { calls } => Content {
                    role: "model".into(),
                    parts: calls
                        .iter()
                        .map(|call| Part {
                            function_call: Some(FunctionCall {
                                name: call.name.clone(),
                                args: call.arguments.clone().into_iter().collect(),
                            }),
                            ..Part::default()
                        })
                        .collect(),
                },
                Turn::ToolResults { results } => Content {
                    role: "user".into(),
                    parts: results
                        .iter()
                        .map(|outcome| {
                            // The wire format requires an object response.
                            let response = match &outcome.payload {
                                Value::Object(_) => outcome.payload.clone(),
                                other => json!({ "result": other }),
                            };
                            Part {
                                function_response: Some(FunctionResponse {
                                    name: outcome.name.clone(),
                                    response,
                                }),
                                ..Part::default()
                            }
                        })
                        .collect(),
                },
            })
            .collect()
    }

    /// Convert tool declarations to Gemini function declarations
    fn convert_declarations(tools: &[ToolDeclaration]) -> Vec<FunctionDeclaration> {
        tools
            .iter()
            .map(|decl| {
                let mut properties = serde_json::Map::new();
                for param in &decl.parameters {
                    properties.insert(
                        param.name.clone(),
                        json!({
                            "type": param.param_type.to_uppercase(),
                            "description": param.description,
                        }),
                    );
                }
                let required: Vec<&str> = decl.required_parameters();
                let mut parameters = json!({
                    "type": "OBJECT",
                    "properties": Value::Object(properties),
                });
                if !required.is_empty() {
                    parameters["required"] = json!(required);
                }
                FunctionDeclaration {
                    name: decl.name.clone(),
                    description: decl.description.clone(),
                    parameters,
                }
            })
            .collect()
    }

    /// Convert a wire response into a model turn
    fn convert_response(response: GenerateContentResponse) -> Result<ModelTurn> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("response carried no candidates".into()))?;

        let mut text = String::new();
        let mut calls = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                let arguments: HashMap<String, Value> = fc.args.into_iter().collect();
                // The wire protocol carries no call ids; generate one so
                // multi-call rounds stay correlated.
                calls.push(ToolCall::new(fc.name, arguments));
            }
        }

        let citations = candidate
            .grounding_metadata
            .map(|gm| {
                gm.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .map(|web| {
                        let citation = Citation::new(web.uri);
                        match web.title {
                            Some(title) => citation.with_title(title),
                            None => citation,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ModelTurn {
            text: if text.is_empty() { None } else { Some(text) },
            calls,
            citations,
        })
    }

    fn map_status(status: reqwest::StatusCode, body: &str) -> AgentError {
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            AgentError::Auth(format!("rejected by provider ({status})"))
        } else {
            AgentError::Provider(format!("{status}: {body}"))
        }
    }

    fn map_transport(error: &reqwest::Error) -> AgentError {
        if error.is_timeout() || error.is_connect() {
            AgentError::ProviderUnavailable(error.to_string())
        } else {
            AgentError::Provider(error.to_string())
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn generate(
        &self,
        instruction: &str,
        history: &[Turn],
        tools: &[ToolDeclaration],
    ) -> Result<ModelTurn> {
        let request = GenerateContentRequest {
            system_instruction: Some(SystemInstruction {
                parts: vec![Part::text(instruction)],
            }),
            contents: Self::convert_history(history),
            tools: if tools.is_empty() {
                Vec::new()
            } else {
                vec![ToolConfig {
                    function_declarations: Self::convert_declarations(tools),
                }]
            },
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::map_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "generateContent failed");
            return Err(Self::map_status(status, &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("undecodable response body: {e}")))?;
        Self::convert_response(parsed)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1beta/models", self.config.base_url);
        let response = self
            .client
            .get(url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| Self::map_transport(&e))?;
        Ok(response.status().is_success())
    }

    fn name(&self) -> &str {
        "Gemini"
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolConfig>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: String,
    title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::attachment::Attachment;
    use agent_core::tool::{ParameterSchema, ToolOutcome};

    fn booking_declaration() -> ToolDeclaration {
        ToolDeclaration {
            name: "book_appointment".into(),
            description: "Book an appointment".into(),
            parameters: vec![
                ParameterSchema::required("doctor", "string", "Doctor id or name"),
                ParameterSchema::required("patient_age", "number", "Patient age"),
            ],
        }
    }

    #[test]
    fn test_attachment_precedes_text() {
        let attachment = Attachment::from_bytes(b"bytes", "image/jpeg", "photo.jpg");
        let history = vec![Turn::user_with_attachment("what is this?", attachment)];

        let contents = GeminiProvider::convert_history(&history);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role, "user");
        assert!(contents[0].parts[0].inline_data.is_some());
        assert_eq!(contents[0].parts[1].text.as_deref(), Some("what is this?"));
    }

    #[test]
    fn test_tool_turns_map_to_function_parts() {
        let mut args = HashMap::new();
        args.insert("doctor".to_string(), json!("Dr. Chen"));
        let call = ToolCall::new("book_appointment", args);
        let outcome = ToolOutcome::error(&call, "not found");

        let history = vec![
            Turn::ToolRequest { calls: vec![call] },
            Turn::ToolResults { results: vec![outcome] },
        ];
        let contents = GeminiProvider::convert_history(&history);

        assert_eq!(contents[0].role, "model");
        let fc = contents[0].parts[0].function_call.as_ref().unwrap();
        assert_eq!(fc.name, "book_appointment");

        assert_eq!(contents[1].role, "user");
        let fr = contents[1].parts[0].function_response.as_ref().unwrap();
        assert_eq!(fr.response["error"], "not found");
    }

    #[test]
    fn test_declaration_schema_shape() {
        let decls = GeminiProvider::convert_declarations(&[booking_declaration()]);
        assert_eq!(decls.len(), 1);
        let params = &decls[0].parameters;
        assert_eq!(params["type"], "OBJECT");
        assert_eq!(params["properties"]["doctor"]["type"], "STRING");
        assert_eq!(params["properties"]["patient_age"]["type"], "NUMBER");
        assert_eq!(params["required"], json!(["doctor", "patient_age"]));
    }

    #[test]
    fn test_response_with_text_calls_and_citations() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Let me look that up." },
                        { "functionCall": { "name": "get_doctors", "args": {} } }
                    ]
                },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://example.org/flu", "title": "Flu basics" } },
                        { "web": null }
                    ]
                }
            }]
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let turn = GeminiProvider::convert_response(parsed).unwrap();

        assert_eq!(turn.text.as_deref(), Some("Let me look that up."));
        assert_eq!(turn.calls.len(), 1);
        assert_eq!(turn.calls[0].name, "get_doctors");
        assert!(!turn.calls[0].call_id.is_empty());
        assert_eq!(turn.citations.len(), 1);
        assert_eq!(turn.citations[0].uri, "https://example.org/flu");
    }

    #[test]
    fn test_empty_candidates_is_parse_error() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(matches!(
            GeminiProvider::convert_response(parsed),
            Err(AgentError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let result = GeminiProvider::from_config(GeminiConfig::default());
        assert!(matches!(result, Err(AgentError::Auth(_))));
    }
}
