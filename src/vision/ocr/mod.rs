// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR for page images
//!
//! Components:
//! - `geometry` - rectangles derived from detection polygons
//! - `line_grouping` - reading-order line reconstruction
//! - `detection` - text region detection (PaddleOCR DB via ONNX)
//! - `bridge` - text region detection through an external command
//! - `recognition` - line text recognition (PaddleOCR CTC via ONNX)
//! - `preprocessing` - model input tensors
//! - `engine` - the page pipeline tying them together

pub mod bridge;
pub mod detection;
pub mod engine;
pub mod geometry;
pub mod line_grouping;
pub mod preprocessing;
pub mod recognition;

pub use bridge::ScriptTextDetector;
pub use detection::{OnnxTextDetector, TextDetector};
pub use engine::{OcrEngine, OcrLine, OcrPage};
pub use geometry::{regions_from_polygons, CropBox, DetectedRegion, Polygon};
pub use line_grouping::{group_lines, TextLine};
pub use recognition::{CharDictionary, OnnxTextRecognizer, TextRecognizer};
