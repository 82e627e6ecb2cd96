// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lecture-script generation
//!
//! A [`LectureWriter`] turns extracted notes into a script written for one
//! TTS engine. The bundled writer talks to a local Ollama server.

pub mod ollama_client;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

use crate::tts::TtsEngine;

pub use ollama_client::{OllamaClient, DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL};
pub use prompts::{build_prompt, system_prompt};

#[derive(Debug, Error)]
pub enum LectureError {
    #[error("Could not connect to Ollama at {0}. Is Ollama running?")]
    Unreachable(String),

    #[error("Ollama returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response format from Ollama: {0}")]
    MalformedResponse(String),

    #[error("Ollama returned an empty lecture script")]
    EmptyResponse,

    #[error("Notes were not usable for a lecture: {0}")]
    InsufficientContent(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Rewrites notes into a lecture script for a TTS engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LectureWriter: Send + Sync {
    /// Model identifier, used in artifact names
    fn model_name(&self) -> &str;

    async fn rewrite(&self, notes: &str, engine: TtsEngine) -> Result<String, LectureError>;
}
