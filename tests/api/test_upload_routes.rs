// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Web routes driven through the router with `oneshot`

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::{DynamicImage, ImageFormat};
use lecture_synth::api::{create_router, AppState};
use lecture_synth::document::DocumentReader;
use lecture_synth::lecture::{LectureError, LectureWriter};
use lecture_synth::pipeline::LecturePipeline;
use lecture_synth::tts::{SpeechSynthesizer, TtsEngine, TtsError, TtsRegistry};
use lecture_synth::vision::ocr::{OcrEngine, Polygon, TextDetector, TextRecognizer};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "lecture-synth-test-boundary";

struct OneLine;

impl TextDetector for OneLine {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Polygon>> {
        Ok(vec![vec![[2.0, 2.0], [30.0, 2.0], [30.0, 14.0], [2.0, 14.0]]])
    }
}

struct Echo;

impl TextRecognizer for Echo {
    fn recognize(&self, _crop: &DynamicImage) -> Result<String> {
        Ok("Thermodynamics".to_string())
    }
}

struct Writer;

#[async_trait]
impl LectureWriter for Writer {
    fn model_name(&self) -> &str {
        "llama3:8b"
    }

    async fn rewrite(&self, notes: &str, _engine: TtsEngine) -> Result<String, LectureError> {
        Ok(format!("Lecture on {}", notes))
    }
}

struct Voice;

#[async_trait]
impl SpeechSynthesizer for Voice {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        Ok(text.as_bytes().to_vec())
    }
}

fn app(dir: &TempDir) -> (Router, AppState) {
    let root = dir.path().join("out");
    let reader = DocumentReader::new(&root)
        .with_ocr(Arc::new(OcrEngine::new(Box::new(OneLine), Box::new(Echo))));
    let tts = TtsRegistry::new()
        .with(TtsEngine::Dia, Arc::new(Voice))
        .with(TtsEngine::ElevenLabsV2, Arc::new(Voice));
    let pipeline = LecturePipeline::new(reader, Arc::new(Writer), tts, &root);

    let state = AppState::new(Arc::new(pipeline), dir.path().join("uploads"));
    (create_router(state.clone()), state)
}

fn png_bytes() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(40, 20)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Build a multipart body from (field, file name, content) parts
fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_serves_form() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(&dir);

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(html.contains("name=\"document\""));
    assert!(html.contains("<option value=\"elevenlabs_v2\" selected>"));
}

#[tokio::test]
async fn test_upload_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(&dir);

    let body = multipart(&[("document", Some(""), &b""[..]), ("tts", None, &b"dia"[..])]);
    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_text(response).await;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("name=\"document\""));
}

#[tokio::test]
async fn test_upload_unsupported_type() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app(&dir);

    let body = multipart(&[("document", Some("notes.docx"), &b"PK\x03\x04"[..])]);
    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let stored = std::fs::read_dir(&state.upload_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_upload_unknown_engine() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(&dir);

    let body = multipart(&[
        ("document", Some("page.png"), png_bytes().as_slice()),
        ("tts", None, &b"espeak"[..]),
    ]);
    let response = app.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_runs_pipeline_and_redirects() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app(&dir);

    let png = png_bytes();
    let body = multipart(&[
        ("document", Some("Lecture Notes.PNG"), png.as_slice()),
        ("tts", None, &b"dia"[..]),
    ]);
    let response = app.clone().oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("/result?job_id="), "{}", location);

    let query = location.trim_start_matches("/result?");
    let mut job_id = "";
    let mut audio_filename = "";
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("job_id", v)) => job_id = v,
            Some(("audio_filename", v)) => audio_filename = v,
            _ => {}
        }
    }
    assert_eq!(job_id.len(), 32);
    assert_eq!(audio_filename, format!("{}_dia.wav", job_id));

    // the upload is kept under a fresh name with a lowercase extension
    let saved = state.upload_dir.join(format!("{}.png", job_id));
    assert_eq!(std::fs::read(saved).unwrap(), png);
    assert_eq!(
        std::fs::read(state.final_output_dir.join(audio_filename)).unwrap(),
        b"Lecture on Thermodynamics"
    );

    let response = app.clone().oneshot(get(&location)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(&format!("/listen/{}", audio_filename)));
    assert!(html.contains(&format!("/download/{}", audio_filename)));

    let response = app
        .clone()
        .oneshot(get(&format!("/listen/{}", audio_filename)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(body_text(response).await, "Lecture on Thermodynamics");

    let response = app
        .oneshot(get(&format!("/download/{}", audio_filename)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(
        disposition,
        format!("attachment; filename=\"{}\"", audio_filename)
    );
}

#[tokio::test]
async fn test_result_without_job_redirects_home() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(&dir);

    for uri in [
        "/result",
        "/result?job_id=abc",
        "/result?job_id=abc&audio_filename=gone.mp3",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }
}

#[tokio::test]
async fn test_missing_audio_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(&dir);

    for uri in ["/download/nothing.mp3", "/listen/nothing.wav"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_download_cannot_escape_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app(&dir);
    std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();
    assert!(state.final_output_dir.starts_with(dir.path()));

    let response = app
        .oneshot(get("/download/..%2F..%2Fsecret.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(&dir);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
