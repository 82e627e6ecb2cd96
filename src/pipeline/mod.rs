// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document to lecture audio
//!
//! Runs the three stages in order: text extraction, lecture-script
//! generation and speech synthesis. Each stage leaves an artifact under the
//! output root:
//!
//! - `OCR_outputs/printed_text_output/<stem>.txt` or
//!   `step_outputs/OCR_outputs/<stem>.txt`
//! - `step_outputs/llm_outputs/<base>_<model>_<engine>.txt`
//! - `Final_Output/<base>_<engine>.<mp3|wav>`

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::document::{save_text, DocumentError, DocumentReader, PageRenderer};
use crate::lecture::{LectureError, LectureWriter, OllamaClient};
use crate::tts::{ElevenLabsClient, ScriptSynthesizer, TtsEngine, TtsError, TtsRegistry};
use crate::vision::ocr::OcrEngine;

pub const LLM_OUTPUT_DIR: &str = "step_outputs/llm_outputs";
pub const FINAL_OUTPUT_DIR: &str = "Final_Output";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("No text was extracted from {0}")]
    NoText(PathBuf),

    #[error("Lecture generation failed: {0}")]
    Lecture(#[from] LectureError),

    #[error("Speech synthesis failed: {0}")]
    Tts(#[from] TtsError),

    #[error("TTS finished but no audio file was found at {0}")]
    MissingAudio(PathBuf),

    #[error("Text extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Files produced by one pipeline run
#[derive(Debug, Clone)]
pub struct LectureArtifacts {
    pub engine: TtsEngine,
    pub text_path: Option<PathBuf>,
    pub script_path: Option<PathBuf>,
    pub audio_path: PathBuf,
    pub audio_filename: String,
}

/// `<base>_<model with ':' replaced by '-'>_<engine>.txt`
pub fn lecture_script_filename(base: &str, model: &str, engine: TtsEngine) -> String {
    format!("{}_{}_{}.txt", base, model.replace(':', "-"), engine)
}

/// `<base>_<engine>.<ext>`
pub fn audio_filename(base: &str, engine: TtsEngine) -> String {
    format!("{}_{}.{}", base, engine, engine.audio_extension())
}

pub struct LecturePipeline {
    reader: DocumentReader,
    writer: Arc<dyn LectureWriter>,
    tts: TtsRegistry,
    output_root: PathBuf,
}

impl std::fmt::Debug for LecturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LecturePipeline")
            .field("reader", &self.reader)
            .field("model", &self.writer.model_name())
            .field("tts", &self.tts)
            .field("output_root", &self.output_root)
            .finish()
    }
}

impl LecturePipeline {
    pub fn new(
        reader: DocumentReader,
        writer: Arc<dyn LectureWriter>,
        tts: TtsRegistry,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            reader,
            writer,
            tts,
            output_root: output_root.into(),
        }
    }

    /// Wire up the real backends
    ///
    /// OCR and ElevenLabs are optional: when their models or API key are
    /// missing the pipeline still starts, and requests that need them fail.
    pub fn from_config(config: &PipelineConfig) -> anyhow::Result<Self> {
        config.validate().map_err(|e| anyhow::anyhow!(e))?;

        let mut reader = DocumentReader::new(&config.output_root)
            .with_renderer(PageRenderer::new(config.ocr.pdf_dpi));
        if config.has_ocr_models() {
            let engine = OcrEngine::from_model_dir(
                &config.ocr.model_dir,
                config.ocr.detector_command.as_deref(),
            )
            .context("Failed to load OCR models")?;
            reader = reader.with_ocr(Arc::new(engine));
        } else {
            warn!(
                "OCR models not found in {}; image input is disabled",
                config.ocr.model_dir.display()
            );
        }

        let writer = OllamaClient::new(&config.ollama.host, &config.ollama.model)?;

        let mut tts = TtsRegistry::new()
            .with(
                TtsEngine::Chatterbox,
                Arc::new(ScriptSynthesizer::new(
                    TtsEngine::Chatterbox,
                    &config.chatterbox.python,
                    &config.chatterbox.script,
                )),
            )
            .with(
                TtsEngine::Dia,
                Arc::new(ScriptSynthesizer::new(
                    TtsEngine::Dia,
                    &config.dia.python,
                    &config.dia.script,
                )),
            );
        match ElevenLabsClient::new(
            config.elevenlabs.api_key.as_deref(),
            config.elevenlabs.voice_id.as_deref(),
            config.elevenlabs.base_url.as_deref(),
        ) {
            Ok(client) => tts.register(TtsEngine::ElevenLabsV2, Arc::new(client)),
            Err(e) => warn!("ElevenLabs disabled: {}", e),
        }

        Ok(Self::new(reader, Arc::new(writer), tts, &config.output_root))
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Directory holding final audio files
    pub fn final_output_dir(&self) -> PathBuf {
        self.output_root.join(FINAL_OUTPUT_DIR)
    }

    pub fn available_engines(&self) -> Vec<TtsEngine> {
        self.tts.available()
    }

    /// Run the whole pipeline on one input file
    ///
    /// `base_name` names the artifacts; it defaults to the input file stem.
    pub async fn run(
        &self,
        input: &Path,
        engine: TtsEngine,
        base_name: Option<&str>,
    ) -> Result<LectureArtifacts, PipelineError> {
        let synthesizer = self.tts.get(engine)?;
        let base = match base_name {
            Some(base) => base.to_string(),
            None => input
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("lecture")
                .to_string(),
        };
        info!("Processing input file: {}", input.display());

        let reader = self.reader.clone();
        let path = input.to_path_buf();
        let extracted = tokio::task::spawn_blocking(move || reader.extract(&path)).await??;

        let notes = extracted.text.trim();
        if notes.is_empty() {
            return Err(PipelineError::NoText(input.to_path_buf()));
        }
        info!("Extracted text length: {} characters", notes.chars().count());

        info!(
            "Generating lecture script with {} for {}",
            self.writer.model_name(),
            engine
        );
        let script = self.writer.rewrite(notes, engine).await?;

        let script_path = self
            .output_root
            .join(LLM_OUTPUT_DIR)
            .join(lecture_script_filename(&base, self.writer.model_name(), engine));
        let script_path = match save_text(&script_path, &script) {
            Ok(()) => {
                info!("Lecture script saved to {}", script_path.display());
                Some(script_path)
            }
            Err(e) => {
                warn!("Failed to save lecture script: {}", e);
                None
            }
        };

        info!("Converting lecture script to speech with {}", engine);
        let audio = synthesizer.synthesize(&script).await?;

        let final_dir = self.final_output_dir();
        tokio::fs::create_dir_all(&final_dir).await?;
        let audio_filename = audio_filename(&base, engine);
        let audio_path = final_dir.join(&audio_filename);
        tokio::fs::write(&audio_path, &audio).await?;

        if !tokio::fs::try_exists(&audio_path).await.unwrap_or(false) {
            return Err(PipelineError::MissingAudio(audio_path));
        }
        info!("Audio output saved to {}", audio_path.display());

        Ok(LectureArtifacts {
            engine,
            text_path: extracted.saved_to,
            script_path,
            audio_path,
            audio_filename,
        })
    }
}
