//! Gemini API client
//!
//! One client serves both pipelines: schema-constrained `generateContent`
//! for label analysis and `streamGenerateContent` SSE for chat replies.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;

use crate::chat::{ChatModel, ChatTurn, Role, TokenStream};
use crate::persona::SYSTEM_PROMPT;
use crate::scan::{GenerationService, ImagePayload};
use crate::{Error, Result};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Client for the Gemini generate-content APIs
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inlineData", rename_all = "camelCase")]
    InlineData { mime_type: String, data: String },
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn joined_text(self) -> String {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect()
    }
}

/// Response schema for the nutrition analysis call; mirrors what the
/// analyzer validates on the way back in
fn nutrition_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "productName": { "type": "STRING" },
            "nutrients": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "value": { "type": "STRING" },
                        "dv": { "type": "STRING" },
                        "score": {
                            "type": "STRING",
                            "enum": ["good", "moderate", "high", "neutral"]
                        }
                    },
                    "required": ["name", "value", "dv", "score"]
                }
            },
            "allergens": { "type": "ARRAY", "items": { "type": "STRING" } },
            "summary": { "type": "STRING" }
        },
        "required": ["productName", "nutrients", "allergens", "summary"]
    })
}

impl GeminiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Gemini API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Use a specific model
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{API_BASE}/{model}:{method}?key={key}",
            model = self.model,
            key = self.api_key
        )
    }

    fn sse_endpoint(&self) -> String {
        format!(
            "{API_BASE}/{model}:streamGenerateContent?alt=sse&key={key}",
            model = self.model,
            key = self.api_key
        )
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate_structured(
        &self,
        payload: &ImagePayload,
        instruction: &str,
    ) -> Result<String> {
        let request = GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::InlineData {
                        mime_type: payload.mime_type.to_string(),
                        data: payload.to_base64(),
                    },
                    Part::Text(instruction.to_string()),
                ],
            }],
            generation_config: Some(json!({
                "responseMimeType": "application/json",
                "responseSchema": nutrition_schema(),
            })),
        };

        tracing::debug!(bytes = payload.data.len(), mime = payload.mime_type, "structured generation request");

        let response = self
            .client
            .post(self.endpoint("generateContent"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("Gemini API error {status}: {body}")));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed.joined_text();
        if text.is_empty() {
            return Err(Error::Provider("empty Gemini response".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn stream_reply(&self, history: &[ChatTurn], message: &str) -> Result<TokenStream> {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                role: Some(match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                }),
                parts: vec![Part::Text(turn.text.clone())],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part::Text(message.to_string())],
        });

        let request = GenerateRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text(SYSTEM_PROMPT.to_string())],
            }),
            contents,
            generation_config: None,
        };

        let response = self
            .client
            .post(self.sse_endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ChatStream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ChatStream(format!(
                "Gemini stream error {status}: {body}"
            )));
        }

        // Forward SSE data lines as text increments; the receiver half is
        // the TokenStream handed back to the session.
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<String>>(32);
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(Error::ChatStream(e.to_string()))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buffer.find('\n') {
                    let line: String = buffer.drain(..=pos).collect();
                    let line = line.trim();
                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data.is_empty() || data == "[DONE]" {
                        continue;
                    }
                    match serde_json::from_str::<GenerateResponse>(data) {
                        Ok(event) => {
                            let text = event.joined_text();
                            if !text.is_empty() && tx.send(Ok(text)).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::trace!(error = %e, "skipping unparseable SSE event");
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
