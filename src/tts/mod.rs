// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text-to-speech engines
//!
//! Three engines are supported. ElevenLabs is reached over HTTP; Chatterbox
//! and Dia run as local Python scripts in their own virtual environments.

pub mod elevenlabs;
pub mod script;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub use elevenlabs::{ElevenLabsClient, DEFAULT_VOICE_ID, ELEVENLABS_MODEL_ID};
pub use script::{venv_python, ScriptSynthesizer};

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("TTS configuration error: {0}")]
    Config(String),

    #[error("{0} is not installed")]
    NotInstalled(String),

    #[error("{engine} script failed: {stderr}")]
    ScriptFailed { engine: TtsEngine, stderr: String },

    #[error("{0} produced no audio")]
    NoAudio(TtsEngine),

    #[error("TTS engine '{0}' is not configured")]
    EngineUnavailable(TtsEngine),

    #[error("ElevenLabs returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Speech synthesis backend
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum TtsEngine {
    #[serde(rename = "chatterbox")]
    #[value(name = "chatterbox")]
    Chatterbox,
    #[default]
    #[serde(rename = "elevenlabs_v2")]
    #[value(name = "elevenlabs_v2")]
    ElevenLabsV2,
    #[serde(rename = "dia")]
    #[value(name = "dia")]
    Dia,
}

impl TtsEngine {
    pub const ALL: [TtsEngine; 3] = [Self::Chatterbox, Self::ElevenLabsV2, Self::Dia];

    /// Name used on the command line, in forms and in file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chatterbox => "chatterbox",
            Self::ElevenLabsV2 => "elevenlabs_v2",
            Self::Dia => "dia",
        }
    }

    /// Extension of the audio the engine produces
    pub fn audio_extension(&self) -> &'static str {
        match self {
            Self::ElevenLabsV2 => "mp3",
            Self::Chatterbox | Self::Dia => "wav",
        }
    }

    /// Human-readable label for the upload form
    pub fn label(&self) -> &'static str {
        match self {
            Self::Chatterbox => "Chatterbox",
            Self::ElevenLabsV2 => "ElevenLabs v2",
            Self::Dia => "Dia",
        }
    }
}

impl fmt::Display for TtsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TtsEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|engine| engine.as_str() == s)
            .ok_or_else(|| {
                format!("unknown TTS engine '{s}' (expected chatterbox, elevenlabs_v2 or dia)")
            })
    }
}

/// Turns a lecture script into audio bytes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError>;
}

/// Configured synthesizer per engine
#[derive(Clone, Default)]
pub struct TtsRegistry {
    engines: HashMap<TtsEngine, Arc<dyn SpeechSynthesizer>>,
}

impl fmt::Debug for TtsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsRegistry")
            .field("engines", &self.available())
            .finish()
    }
}

impl TtsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, engine: TtsEngine, synthesizer: Arc<dyn SpeechSynthesizer>) {
        self.engines.insert(engine, synthesizer);
    }

    pub fn with(mut self, engine: TtsEngine, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.register(engine, synthesizer);
        self
    }

    pub fn get(&self, engine: TtsEngine) -> Result<Arc<dyn SpeechSynthesizer>, TtsError> {
        self.engines
            .get(&engine)
            .cloned()
            .ok_or(TtsError::EngineUnavailable(engine))
    }

    /// Registered engines in declaration order
    pub fn available(&self) -> Vec<TtsEngine> {
        TtsEngine::ALL
            .into_iter()
            .filter(|engine| self.engines.contains_key(engine))
            .collect()
    }
}
