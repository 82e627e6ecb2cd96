// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod document;
pub mod lecture;
pub mod pipeline;
pub mod tts;
pub mod version;
pub mod vision;

pub use config::PipelineConfig;
pub use document::{DocumentError, DocumentReader, ExtractedText, TextSource};
pub use lecture::{LectureError, LectureWriter, OllamaClient};
pub use pipeline::{LectureArtifacts, LecturePipeline, PipelineError};
pub use tts::{SpeechSynthesizer, TtsEngine, TtsError, TtsRegistry};
pub use vision::ocr::{group_lines, DetectedRegion, OcrEngine, OcrPage, TextLine};
