// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Engine selection and the script-backed synthesizers

use async_trait::async_trait;
use lecture_synth::tts::{ScriptSynthesizer, SpeechSynthesizer, TtsEngine, TtsError, TtsRegistry};
use std::sync::Arc;

struct Tone(&'static [u8]);

#[async_trait]
impl SpeechSynthesizer for Tone {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, TtsError> {
        Ok(self.0.to_vec())
    }
}

#[tokio::test]
async fn test_registry_dispatches_by_engine() {
    let registry = TtsRegistry::new()
        .with(TtsEngine::Dia, Arc::new(Tone(b"dia")))
        .with(TtsEngine::Chatterbox, Arc::new(Tone(b"chatterbox")));

    assert_eq!(
        registry.available(),
        vec![TtsEngine::Chatterbox, TtsEngine::Dia]
    );
    let dia = registry.get(TtsEngine::Dia).unwrap();
    assert_eq!(dia.synthesize("hi").await.unwrap(), b"dia");

    assert!(matches!(
        registry.get(TtsEngine::ElevenLabsV2),
        Err(TtsError::EngineUnavailable(TtsEngine::ElevenLabsV2))
    ));
}

#[test]
fn test_engine_names_parse() {
    for engine in TtsEngine::ALL {
        assert_eq!(engine.as_str().parse::<TtsEngine>().unwrap(), engine);
    }
    assert!("elevenlabs".parse::<TtsEngine>().is_err());
    assert_eq!(TtsEngine::default(), TtsEngine::ElevenLabsV2);
}

#[tokio::test]
async fn test_missing_script_is_not_installed() {
    let synth = ScriptSynthesizer::new(TtsEngine::Dia, "python3", "/nonexistent/dia_tts.py");
    assert!(matches!(
        synth.synthesize("hello").await,
        Err(TtsError::NotInstalled(_))
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn test_script_writes_audio_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("chatterbox_tts.sh");
    // args: --text <text> --output <path>
    std::fs::write(&script, "printf 'RIFF:%s' \"$2\" > \"$4\"\n").unwrap();

    let synth = ScriptSynthesizer::new(TtsEngine::Chatterbox, "sh", &script);
    let audio = synth.synthesize("Good morning").await.unwrap();
    assert_eq!(audio, b"RIFF:Good morning");
}

#[cfg(unix)]
#[tokio::test]
async fn test_script_failure_reports_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("dia_tts.sh");
    std::fs::write(&script, "echo 'CUDA out of memory' >&2\nexit 3\n").unwrap();

    let synth = ScriptSynthesizer::new(TtsEngine::Dia, "sh", &script);
    match synth.synthesize("text").await.unwrap_err() {
        TtsError::ScriptFailed { engine, stderr } => {
            assert_eq!(engine, TtsEngine::Dia);
            assert_eq!(stderr, "CUDA out of memory");
        }
        other => panic!("expected ScriptFailed, got {:?}", other),
    }
}
