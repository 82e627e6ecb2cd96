// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for Lecture Synth

/// Full version string with feature description
pub const VERSION: &str = "v0.3.0-scanned-pdf-ocr-2025-11-02";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-11-02";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "pdf-text",
    "scanned-pdf-ocr",
    "image-ocr",
    "line-grouping",
    "ollama-lecture-scripts",
    "tts-elevenlabs",
    "tts-chatterbox",
    "tts-dia",
    "web-upload",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Lecture Synth {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
