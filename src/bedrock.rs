//! Bedrock Converse client — single-turn `invoke(prompt) -> text`.
//!
//! Endpoint: `{endpoint}/model/{model_id}/converse`, bearer API key auth.
//! Timeout: `bedrock.timeout_secs` per call. No retries.

use serde::Deserialize;
use std::time::Duration;

use crate::config::BedrockConfig;
use crate::provider::TextGenerator;
use crate::{RcaError, RcaResult};

#[derive(Debug, Deserialize)]
struct ConverseResponse {
    output: ConverseOutput,
    #[serde(default, rename = "stopReason")]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: ConverseMessage,
}

#[derive(Debug, Deserialize)]
struct ConverseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

pub struct BedrockClient {
    agent: ureq::Agent,
    url: String,
    auth: Option<String>,
    model_id: String,
    max_tokens: u32,
    temperature: f64,
}

impl BedrockClient {
    pub fn new(cfg: &BedrockConfig, api_key: Option<&str>) -> RcaResult<Self> {
        let model_id = cfg.model_id.trim();
        if model_id.is_empty() {
            return Err(RcaError::Config("bedrock.model_id is required".into()));
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(cfg.timeout_secs)))
            .build()
            .into();

        Ok(Self {
            agent,
            url: format!(
                "{}/model/{}/converse",
                cfg.endpoint(),
                urlencoding::encode(model_id)
            ),
            auth: api_key
                .filter(|k| !k.trim().is_empty())
                .map(|k| format!("Bearer {}", k.trim())),
            model_id: model_id.to_string(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        })
    }
}

impl TextGenerator for BedrockClient {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn invoke(&self, prompt: &str) -> RcaResult<String> {
        tracing::info!(model = %self.model_id, prompt_len = prompt.len(), "Bedrock call starting");

        let body = serde_json::json!({
            "messages": [{"role": "user", "content": [{"text": prompt}]}],
            "inferenceConfig": {
                "maxTokens": self.max_tokens,
                "temperature": self.temperature,
            }
        });

        let mut request = self.agent.post(self.url.as_str());
        if let Some(auth) = &self.auth {
            request = request.header("Authorization", auth);
        }

        let mut response = request
            .send_json(&body)
            .map_err(|e| RcaError::Generation(format!("Bedrock call failed: {}", e)))?;
        let parsed: ConverseResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| RcaError::Generation(format!("Bedrock response undecodable: {}", e)))?;

        let text: String = parsed
            .output
            .message
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            tracing::warn!(
                model = %self.model_id,
                stop_reason = ?parsed.stop_reason,
                "Bedrock returned empty response"
            );
            return Err(RcaError::Generation("Bedrock returned empty response".into()));
        }

        tracing::debug!(
            model = %self.model_id,
            response_len = text.len(),
            stop_reason = ?parsed.stop_reason,
            "Bedrock call complete"
        );
        Ok(text)
    }
}
