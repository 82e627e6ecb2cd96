// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Environment-driven configuration

use std::env;
use std::path::{Path, PathBuf};

use crate::lecture::{DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL};
use crate::tts::venv_python;

pub const DEFAULT_OCR_MODEL_DIR: &str = "./models/paddleocr-onnx";
pub const DEFAULT_PDF_DPI: u32 = 200;
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Everything the lecture pipeline and its front ends need
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub ollama: OllamaConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub ocr: OcrConfig,
    pub chatterbox: ScriptTtsConfig,
    pub dia: ScriptTtsConfig,
    /// Root under which `step_outputs/`, `OCR_outputs/` and `Final_Output/`
    /// are created
    pub output_root: PathBuf,
    /// Where the web front end stores uploads
    pub upload_dir: PathBuf,
    /// Listen address of the web front end
    pub bind_addr: String,
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
}

#[derive(Clone, Default)]
pub struct ElevenLabsConfig {
    pub api_key: Option<String>,
    pub voice_id: Option<String>,
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ElevenLabsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("voice_id", &self.voice_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Directory holding `det_model.onnx`, `rec_model.onnx` and
    /// `ppocr_keys_v1.txt`
    pub model_dir: PathBuf,
    /// External detector command used instead of `det_model.onnx`
    pub detector_command: Option<String>,
    /// Resolution for rendering scanned PDF pages
    pub pdf_dpi: u32,
}

/// Interpreter and script of a local TTS model
#[derive(Debug, Clone)]
pub struct ScriptTtsConfig {
    pub python: PathBuf,
    pub script: PathBuf,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ollama: OllamaConfig {
                host: non_empty_var("OLLAMA_HOST").unwrap_or(defaults.ollama.host),
                model: non_empty_var("OLLAMA_MODEL").unwrap_or(defaults.ollama.model),
            },
            elevenlabs: ElevenLabsConfig {
                api_key: non_empty_var("ELEVENLABS_API_KEY"),
                voice_id: non_empty_var("ELEVENLABS_VOICE_ID"),
                base_url: non_empty_var("ELEVENLABS_BASE_URL"),
            },
            ocr: OcrConfig {
                model_dir: non_empty_var("OCR_MODEL_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ocr.model_dir),
                detector_command: non_empty_var("OCR_DETECTOR_COMMAND"),
                pdf_dpi: env::var("OCR_PDF_DPI")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_PDF_DPI),
            },
            chatterbox: ScriptTtsConfig {
                python: non_empty_var("CHATTERBOX_PYTHON")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.chatterbox.python),
                script: non_empty_var("CHATTERBOX_SCRIPT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.chatterbox.script),
            },
            dia: ScriptTtsConfig {
                python: non_empty_var("DIA_PYTHON")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.dia.python),
                script: non_empty_var("DIA_SCRIPT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.dia.script),
            },
            output_root: non_empty_var("LECTURE_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            upload_dir: non_empty_var("LECTURE_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            bind_addr: non_empty_var("LECTURE_BIND").unwrap_or(defaults.bind_addr),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.ollama.model.trim().is_empty() {
            return Err("Ollama model name must not be empty".to_string());
        }
        let host = &self.ollama.host;
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(format!(
                "OLLAMA_HOST must be an http(s) URL, got '{}'",
                self.ollama.host
            ));
        }
        if self.ocr.pdf_dpi == 0 {
            return Err("OCR_PDF_DPI must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Whether the ONNX model files are present
    pub fn has_ocr_models(&self) -> bool {
        use crate::vision::ocr::engine::{
            DETECTION_MODEL_FILE, DICTIONARY_FILE, RECOGNITION_MODEL_FILE,
        };
        let dir = &self.ocr.model_dir;
        let detector_ready =
            self.ocr.detector_command.is_some() || dir.join(DETECTION_MODEL_FILE).is_file();
        detector_ready
            && dir.join(RECOGNITION_MODEL_FILE).is_file()
            && dir.join(DICTIONARY_FILE).is_file()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig {
                host: DEFAULT_OLLAMA_HOST.to_string(),
                model: DEFAULT_OLLAMA_MODEL.to_string(),
            },
            elevenlabs: ElevenLabsConfig::default(),
            ocr: OcrConfig {
                model_dir: PathBuf::from(DEFAULT_OCR_MODEL_DIR),
                detector_command: None,
                pdf_dpi: DEFAULT_PDF_DPI,
            },
            chatterbox: ScriptTtsConfig {
                python: venv_python(Path::new(".venv_chatter")),
                script: PathBuf::from("TTS/chatterbox_audio.py"),
            },
            dia: ScriptTtsConfig {
                python: venv_python(Path::new(".venv_dia")),
                script: PathBuf::from("TTS/Dia_audio.py"),
            },
            output_root: PathBuf::from("."),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            bind_addr: DEFAULT_BIND.to_string(),
        }
    }
}
