// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end runs with stand-in models

use anyhow::Result;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use lecture_synth::document::DocumentReader;
use lecture_synth::lecture::{LectureError, LectureWriter};
use lecture_synth::pipeline::{LecturePipeline, PipelineError};
use lecture_synth::tts::{SpeechSynthesizer, TtsEngine, TtsError, TtsRegistry};
use lecture_synth::vision::ocr::{OcrEngine, Polygon, TextDetector, TextRecognizer};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

struct FixedDetector(Vec<Polygon>);

impl TextDetector for FixedDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Polygon>> {
        Ok(self.0.clone())
    }
}

struct Echo(&'static str);

impl TextRecognizer for Echo {
    fn recognize(&self, _crop: &DynamicImage) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Records the notes it is given and returns a canned script
#[derive(Default)]
struct RecordingWriter {
    calls: Mutex<Vec<(String, TtsEngine)>>,
}

#[async_trait]
impl LectureWriter for RecordingWriter {
    fn model_name(&self) -> &str {
        "llama3:8b"
    }

    async fn rewrite(&self, notes: &str, engine: TtsEngine) -> Result<String, LectureError> {
        self.calls
            .lock()
            .unwrap()
            .push((notes.to_string(), engine));
        Ok(format!("Today we cover: {}", notes))
    }
}

struct RefusingWriter;

#[async_trait]
impl LectureWriter for RefusingWriter {
    fn model_name(&self) -> &str {
        "llama3:8b"
    }

    async fn rewrite(&self, _notes: &str, _engine: TtsEngine) -> Result<String, LectureError> {
        Err(LectureError::InsufficientContent(
            "ERROR: Unable to generate lecture".to_string(),
        ))
    }
}

/// Returns the script bytes prefixed with a fake header
#[derive(Default)]
struct FakeVoice {
    texts: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeVoice {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(format!("RIFF{}", text).into_bytes())
    }
}

fn page_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbImage::new(120, 60)
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}

fn reader(root: &Path, regions: Vec<Polygon>, text: &'static str) -> DocumentReader {
    DocumentReader::new(root).with_ocr(Arc::new(OcrEngine::new(
        Box::new(FixedDetector(regions)),
        Box::new(Echo(text)),
    )))
}

fn one_line() -> Vec<Polygon> {
    vec![vec![[5.0, 5.0], [100.0, 5.0], [100.0, 25.0], [5.0, 25.0]]]
}

#[tokio::test]
async fn test_image_to_audio() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("out");
    let input = page_image(dir.path(), "lecture3.png");

    let writer = Arc::new(RecordingWriter::default());
    let voice = Arc::new(FakeVoice::default());
    let pipeline = LecturePipeline::new(
        reader(&root, one_line(), "Krebs cycle"),
        writer.clone(),
        TtsRegistry::new().with(TtsEngine::Dia, voice.clone()),
        &root,
    );
    assert_eq!(pipeline.available_engines(), vec![TtsEngine::Dia]);

    let artifacts = pipeline.run(&input, TtsEngine::Dia, None).await.unwrap();

    assert_eq!(artifacts.engine, TtsEngine::Dia);
    assert_eq!(
        artifacts.text_path.as_deref(),
        Some(root.join("step_outputs/OCR_outputs/lecture3.txt").as_path())
    );
    assert_eq!(
        artifacts.script_path.as_deref(),
        Some(
            root.join("step_outputs/llm_outputs/lecture3_llama3-8b_dia.txt")
                .as_path()
        )
    );
    assert_eq!(artifacts.audio_filename, "lecture3_dia.wav");
    assert_eq!(artifacts.audio_path, root.join("Final_Output/lecture3_dia.wav"));

    assert_eq!(
        *writer.calls.lock().unwrap(),
        vec![("Krebs cycle".to_string(), TtsEngine::Dia)]
    );
    assert_eq!(
        std::fs::read_to_string(artifacts.script_path.unwrap()).unwrap(),
        "Today we cover: Krebs cycle"
    );
    assert_eq!(
        std::fs::read(&artifacts.audio_path).unwrap(),
        b"RIFFToday we cover: Krebs cycle"
    );
    assert_eq!(voice.texts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_base_name_overrides_stem() {
    let dir = tempfile::tempdir().unwrap();
    let input = page_image(dir.path(), "upload.png");

    let pipeline = LecturePipeline::new(
        reader(dir.path(), one_line(), "notes"),
        Arc::new(RecordingWriter::default()),
        TtsRegistry::new().with(TtsEngine::ElevenLabsV2, Arc::new(FakeVoice::default())),
        dir.path(),
    );

    let artifacts = pipeline
        .run(&input, TtsEngine::ElevenLabsV2, Some("4f9a"))
        .await
        .unwrap();
    assert_eq!(artifacts.audio_filename, "4f9a_elevenlabs_v2.mp3");
    assert!(artifacts.audio_path.is_file());
}

#[tokio::test]
async fn test_blank_page_is_no_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = page_image(dir.path(), "blank.png");
    let writer = Arc::new(RecordingWriter::default());

    let pipeline = LecturePipeline::new(
        reader(dir.path(), Vec::new(), "unused"),
        writer.clone(),
        TtsRegistry::new().with(TtsEngine::Dia, Arc::new(FakeVoice::default())),
        dir.path(),
    );

    let err = pipeline.run(&input, TtsEngine::Dia, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoText(_)));
    assert!(writer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_refusal_stops_before_synthesis() {
    let dir = tempfile::tempdir().unwrap();
    let input = page_image(dir.path(), "page.png");
    let voice = Arc::new(FakeVoice::default());

    let pipeline = LecturePipeline::new(
        reader(dir.path(), one_line(), "???"),
        Arc::new(RefusingWriter),
        TtsRegistry::new().with(TtsEngine::Chatterbox, voice.clone()),
        dir.path(),
    );

    let err = pipeline
        .run(&input, TtsEngine::Chatterbox, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Lecture(LectureError::InsufficientContent(_))
    ));
    assert!(voice.texts.lock().unwrap().is_empty());
    assert!(!dir.path().join("Final_Output").exists());
}

#[tokio::test]
async fn test_script_save_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = page_image(dir.path(), "page.png");
    // a file where the script directory should go
    std::fs::create_dir_all(dir.path().join("step_outputs")).unwrap();
    std::fs::write(dir.path().join("step_outputs/llm_outputs"), b"").unwrap();

    let pipeline = LecturePipeline::new(
        reader(dir.path(), one_line(), "Entropy"),
        Arc::new(RecordingWriter::default()),
        TtsRegistry::new().with(TtsEngine::Dia, Arc::new(FakeVoice::default())),
        dir.path(),
    );

    let artifacts = pipeline.run(&input, TtsEngine::Dia, None).await.unwrap();
    assert!(artifacts.script_path.is_none());
    assert!(artifacts.audio_path.is_file());
}

#[tokio::test]
async fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = LecturePipeline::new(
        reader(dir.path(), one_line(), "x"),
        Arc::new(RecordingWriter::default()),
        TtsRegistry::new().with(TtsEngine::Dia, Arc::new(FakeVoice::default())),
        dir.path(),
    );

    let err = pipeline
        .run(&dir.path().join("missing.png"), TtsEngine::Dia, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}
