// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ElevenLabs text-to-speech client

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{SpeechSynthesizer, TtsEngine, TtsError};

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";
pub const ELEVENLABS_MODEL_ID: &str = "eleven_multilingual_v2";
pub const OUTPUT_FORMAT: &str = "mp3_44100_128";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Client for the ElevenLabs `/v1/text-to-speech` endpoint
#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
    api_key: String,
    voice_id: String,
}

impl std::fmt::Debug for ElevenLabsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsClient")
            .field("base_url", &self.base_url)
            .field("voice_id", &self.voice_id)
            .finish_non_exhaustive()
    }
}

impl ElevenLabsClient {
    /// Create a client; the API key is required
    pub fn new(
        api_key: Option<&str>,
        voice_id: Option<&str>,
        base_url: Option<&str>,
    ) -> Result<Self, TtsError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TtsError::Config("ELEVENLABS_API_KEY is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let voice_id = voice_id.unwrap_or(DEFAULT_VOICE_ID).to_string();
        info!(
            "ElevenLabs client configured: base_url={}, voice={}",
            base_url, voice_id
        );

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            voice_id,
        })
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    fn speech_url(&self) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.base_url, self.voice_id, OUTPUT_FORMAT
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        let url = self.speech_url();
        debug!("ElevenLabs POST {} ({} chars)", url, text.len());

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&SpeechRequest {
                text,
                model_id: ELEVENLABS_MODEL_ID,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api { status, body });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(TtsError::NoAudio(TtsEngine::ElevenLabsV2));
        }
        info!("ElevenLabs returned {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }
}
