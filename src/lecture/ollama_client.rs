// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ollama client for lecture-script generation via `/api/generate`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::prompts::{build_prompt, is_refusal};
use super::{LectureError, LectureWriter};
use crate::tts::TtsEngine;

pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3:8b";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Non-streaming client for a local Ollama server
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(endpoint: &str, model: &str) -> Result<Self, LectureError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Ollama client configured: endpoint={}, model={}",
            endpoint, model
        );

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check that the Ollama server answers
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.endpoint))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Ollama health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl LectureWriter for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn rewrite(&self, notes: &str, engine: TtsEngine) -> Result<String, LectureError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(engine, notes),
            stream: false,
        };
        debug!(
            "Ollama generate POST {} (engine={}, {} chars of notes)",
            url,
            engine,
            notes.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LectureError::Unreachable(self.endpoint.clone())
                } else {
                    LectureError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LectureError::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|_| LectureError::MalformedResponse(body.clone()))?;
        let script = parsed
            .response
            .ok_or_else(|| LectureError::MalformedResponse(body.clone()))?
            .trim()
            .to_string();

        if script.is_empty() {
            return Err(LectureError::EmptyResponse);
        }
        if is_refusal(&script) {
            warn!("Model declined to write a lecture: {}", script);
            return Err(LectureError::InsufficientContent(
                script.trim_matches('*').trim().to_string(),
            ));
        }

        info!("Generated lecture script ({} chars)", script.len());
        Ok(script)
    }
}
