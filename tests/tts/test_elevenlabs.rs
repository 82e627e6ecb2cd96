// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ElevenLabs client against a local stand-in server

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use lecture_synth::tts::{
    ElevenLabsClient, SpeechSynthesizer, TtsError, DEFAULT_VOICE_ID, ELEVENLABS_MODEL_ID,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct SeenRequest {
    voice: String,
    query: HashMap<String, String>,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct FakeElevenLabs {
    status: StatusCode,
    audio: Vec<u8>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

async fn speech(
    State(fake): State<FakeElevenLabs>,
    Path(voice): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    fake.seen.lock().unwrap().push(SeenRequest {
        voice,
        query,
        api_key: headers
            .get("xi-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (fake.status, fake.audio.clone())
}

async fn spawn_elevenlabs(
    status: StatusCode,
    audio: &[u8],
) -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeElevenLabs {
        status,
        audio: audio.to_vec(),
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/v1/text-to-speech/:voice", post(speech))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

#[tokio::test]
async fn test_synthesize_request_shape() {
    let (url, seen) = spawn_elevenlabs(StatusCode::OK, b"ID3fake-mp3").await;
    let client = ElevenLabsClient::new(Some("sk-test"), None, Some(&url)).unwrap();

    let audio = client.synthesize("<speak>Hello class.</speak>").await.unwrap();
    assert_eq!(audio, b"ID3fake-mp3");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let request = &seen[0];
    assert_eq!(request.voice, DEFAULT_VOICE_ID);
    assert_eq!(
        request.query.get("output_format").map(String::as_str),
        Some("mp3_44100_128")
    );
    assert_eq!(request.api_key.as_deref(), Some("sk-test"));
    assert_eq!(request.body["text"], "<speak>Hello class.</speak>");
    assert_eq!(request.body["model_id"], ELEVENLABS_MODEL_ID);
}

#[tokio::test]
async fn test_custom_voice() {
    let (url, seen) = spawn_elevenlabs(StatusCode::OK, b"mp3").await;
    let client = ElevenLabsClient::new(Some("sk-test"), Some("voice123"), Some(&url)).unwrap();
    assert_eq!(client.voice_id(), "voice123");

    client.synthesize("text").await.unwrap();
    assert_eq!(seen.lock().unwrap()[0].voice, "voice123");
}

#[tokio::test]
async fn test_api_error_status() {
    let (url, _) = spawn_elevenlabs(StatusCode::UNAUTHORIZED, b"invalid api key").await;
    let client = ElevenLabsClient::new(Some("sk-bad"), None, Some(&url)).unwrap();

    match client.synthesize("text").await.unwrap_err() {
        TtsError::Api { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_audio_is_an_error() {
    let (url, _) = spawn_elevenlabs(StatusCode::OK, b"").await;
    let client = ElevenLabsClient::new(Some("sk-test"), None, Some(&url)).unwrap();

    assert!(matches!(
        client.synthesize("text").await,
        Err(TtsError::NoAudio(_))
    ));
}

#[test]
fn test_missing_key_is_config_error() {
    assert!(matches!(
        ElevenLabsClient::new(None, None, None),
        Err(TtsError::Config(_))
    ));
    assert!(matches!(
        ElevenLabsClient::new(Some("   "), None, None),
        Err(TtsError::Config(_))
    ));
}

#[test]
fn test_debug_hides_key() {
    let client = ElevenLabsClient::new(Some("sk-secret"), None, None).unwrap();
    assert!(!format!("{:?}", client).contains("sk-secret"));
}
