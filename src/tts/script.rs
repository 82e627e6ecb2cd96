// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local TTS models driven through Python scripts
//!
//! Each script is invoked as `<python> <script> --text <text> --output <file>`
//! and must write the audio to `<file>`. A non-zero exit status is reported
//! with the script's stderr.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use super::{SpeechSynthesizer, TtsEngine, TtsError};

/// Interpreter inside a virtual environment directory
pub fn venv_python(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join("python.exe")
    } else {
        venv_dir.join("bin").join("python")
    }
}

#[derive(Debug, Clone)]
pub struct ScriptSynthesizer {
    engine: TtsEngine,
    python: PathBuf,
    script: PathBuf,
}

impl ScriptSynthesizer {
    pub fn new(
        engine: TtsEngine,
        python: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            python: python.into(),
            script: script.into(),
        }
    }

    /// A bare program name is resolved through `PATH` at spawn time, so only
    /// explicit paths are checked up front.
    fn check_installed(&self) -> Result<(), TtsError> {
        let is_explicit = self.python.components().count() > 1;
        if is_explicit && !self.python.exists() {
            return Err(TtsError::NotInstalled(format!(
                "{} interpreter at {}",
                self.engine,
                self.python.display()
            )));
        }
        if !self.script.exists() {
            return Err(TtsError::NotInstalled(format!(
                "{} script at {}",
                self.engine,
                self.script.display()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        self.check_installed()?;

        let scratch = tempfile::tempdir()?;
        let output_path = scratch
            .path()
            .join(format!("speech.{}", self.engine.audio_extension()));

        info!(
            "Running {} TTS script {}",
            self.engine,
            self.script.display()
        );
        let output = Command::new(&self.python)
            .arg(&self.script)
            .arg("--text")
            .arg(text)
            .arg("--output")
            .arg(&output_path)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => TtsError::NotInstalled(format!(
                    "{} interpreter {}",
                    self.engine,
                    self.python.display()
                )),
                _ => TtsError::Io(e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(TtsError::ScriptFailed {
                engine: self.engine,
                stderr,
            });
        }
        if !stderr.is_empty() {
            debug!("{} TTS stderr: {}", self.engine, stderr);
        }

        let audio = match tokio::fs::read(&output_path).await {
            Ok(audio) => audio,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TtsError::NoAudio(self.engine))
            }
            Err(e) => return Err(e.into()),
        };
        if audio.is_empty() {
            return Err(TtsError::NoAudio(self.engine));
        }
        Ok(audio)
    }
}
