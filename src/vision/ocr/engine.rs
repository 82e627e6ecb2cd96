// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Page-level OCR: detect, group into lines, crop and recognize

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::bridge::ScriptTextDetector;
use super::detection::{OnnxTextDetector, TextDetector};
use super::geometry::{regions_from_polygons, CropBox, DetectedRegion, LINE_CROP_PADDING};
use super::line_grouping::group_lines;
use super::recognition::{OnnxTextRecognizer, TextRecognizer};
use crate::vision::image_utils::load_image;

/// File names expected inside an OCR model directory
pub const DETECTION_MODEL_FILE: &str = "det_model.onnx";
pub const RECOGNITION_MODEL_FILE: &str = "rec_model.onnx";
pub const DICTIONARY_FILE: &str = "ppocr_keys_v1.txt";

/// One recognized text line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    /// Union of the line's regions, before padding
    pub bounds: DetectedRegion,
    pub text: String,
}

/// Result of OCR over one page image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrPage {
    /// Line texts joined with `\n`, top to bottom
    pub text: String,
    pub lines: Vec<OcrLine>,
    pub processing_time_ms: u64,
}

impl OcrPage {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Detector + recognizer pair driving the line pipeline
pub struct OcrEngine {
    detector: Box<dyn TextDetector>,
    recognizer: Box<dyn TextRecognizer>,
}

impl std::fmt::Debug for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrEngine").finish_non_exhaustive()
    }
}

impl OcrEngine {
    pub fn new(detector: Box<dyn TextDetector>, recognizer: Box<dyn TextRecognizer>) -> Self {
        Self {
            detector,
            recognizer,
        }
    }

    /// Load the ONNX models from `model_dir`
    ///
    /// When `detector_command` is set, detection runs through that external
    /// command instead of `det_model.onnx`.
    pub fn from_model_dir<P: AsRef<Path>>(
        model_dir: P,
        detector_command: Option<&str>,
    ) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        info!("Loading OCR engine from {}", model_dir.display());

        let detector: Box<dyn TextDetector> = match detector_command {
            Some(command) => {
                info!("Using external text detector: {}", command);
                Box::new(ScriptTextDetector::from_command_line(command)?)
            }
            None => Box::new(OnnxTextDetector::new(model_dir.join(DETECTION_MODEL_FILE))?),
        };
        let recognizer = OnnxTextRecognizer::new(
            model_dir.join(RECOGNITION_MODEL_FILE),
            model_dir.join(DICTIONARY_FILE),
        )?;

        Ok(Self::new(detector, Box::new(recognizer)))
    }

    /// Run the full pipeline on a decoded page
    pub fn recognize_page(&self, image: &DynamicImage) -> Result<OcrPage> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let polygons = self
            .detector
            .detect(image)
            .context("text detection failed")?;
        let regions = regions_from_polygons(&polygons);
        debug!(
            "{} of {} detected regions kept after size filter",
            regions.len(),
            polygons.len()
        );

        let mut lines = Vec::new();
        for line in group_lines(regions) {
            let bounds = line.bounds();
            let Some(crop) = CropBox::around(&bounds, LINE_CROP_PADDING, width, height) else {
                warn!("Skipping line outside the image: {:?}", bounds);
                continue;
            };

            let line_image = image.crop_imm(crop.x, crop.y, crop.width, crop.height);
            let text = self
                .recognizer
                .recognize(&line_image)
                .context("text recognition failed")?;
            lines.push(OcrLine { bounds, text });
        }

        let text = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let page = OcrPage {
            text,
            lines,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "OCR recognized {} lines in {} ms",
            page.lines.len(),
            page.processing_time_ms
        );
        Ok(page)
    }

    /// Load an image file and run [`recognize_page`](Self::recognize_page)
    pub fn recognize_path<P: AsRef<Path>>(&self, path: P) -> Result<OcrPage> {
        let path = path.as_ref();
        let image = load_image(path)?;
        self.recognize_page(&image)
    }
}
