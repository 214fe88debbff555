use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ai::AiProvider;
use crate::error::{BotError, Result};
use crate::types::{ConversationHistory, Turn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Turn],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Turn>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Returns the first candidate's content, or explains why there is none.
    fn into_reply(self) -> Result<Turn> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no reason given".to_string());
            return Err(BotError::GeminiResponse(format!(
                "No candidates in response ({reason})"
            )));
        };

        match candidate.content {
            Some(content) if !content.parts.is_empty() => Ok(content),
            _ => Err(BotError::GeminiResponse(format!(
                "Empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))),
        }
    }
}

pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
    endpoint: Url,
}

impl GeminiClient {
    pub fn new(api_key: String, model: &str) -> Result<Self> {
        Self::with_base_url(api_key, model, GEMINI_API_BASE)
    }

    /// Points the client at another API root, e.g. a regional endpoint.
    pub fn with_base_url(api_key: String, model: &str, base_url: &str) -> Result<Self> {
        let endpoint = Url::parse(base_url)?.join(&format!("models/{model}:generateContent"))?;
        debug!("Gemini endpoint: {endpoint}");
        Ok(Self {
            api_key,
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    async fn generate(&self, contents: &[Turn], json_mode: bool) -> Result<Turn> {
        debug!("Sending request to Gemini API with {} turns", contents.len());

        let request = GenerateContentRequest {
            contents,
            generation_config: json_mode.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::GeminiApi { status, message });
        }

        let api_response: GenerateContentResponse = response.json().await?;
        let reply = api_response.into_reply()?;
        debug!("Received response from Gemini API");
        Ok(reply)
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn continue_conversation(
        &self,
        history: &ConversationHistory,
        text: &str,
    ) -> Result<(String, ConversationHistory)> {
        let mut updated = history.clone();
        updated.push(Turn::user(text));

        let reply = self.generate(&updated, false).await?;
        let reply_text = reply.joined_text();
        updated.push(Turn::model(reply_text.clone()));

        Ok((reply_text, updated))
    }

    async fn classify(&self, prompt: &str) -> Result<String> {
        let reply = self.generate(&[Turn::user(prompt)], true).await?;
        Ok(reply.joined_text())
    }
}
