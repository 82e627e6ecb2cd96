// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text recognition model
//!
//! Recognizes the text of one cropped line image. Output is greedy-decoded
//! CTC over a character dictionary whose index 0 is the blank token.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use ndarray::{ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::preprocess_for_recognition;

/// Reads the text in a single line crop
#[cfg_attr(test, mockall::automock)]
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, crop: &DynamicImage) -> Result<String>;
}

/// Character table for CTC decoding
#[derive(Debug, Clone, PartialEq)]
pub struct CharDictionary {
    chars: Vec<char>,
}

impl CharDictionary {
    /// Load a dictionary file, one character per line
    ///
    /// Index 0 is reserved for the CTC blank. A space is appended when the
    /// file does not contain one.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            lines.push(line.context("Failed to read dictionary line")?);
        }
        Ok(Self::from_lines(lines))
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut chars = vec!['\0'];
        chars.extend(
            lines
                .into_iter()
                .filter_map(|line| line.as_ref().chars().next()),
        );
        if !chars[1..].contains(&' ') {
            chars.push(' ');
        }
        Self { chars }
    }

    /// Number of classes including the blank
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.len() <= 1
    }

    fn get(&self, index: usize) -> Option<char> {
        match index {
            0 => None,
            i => self.chars.get(i).copied(),
        }
    }

    /// Greedy CTC decode of `[T, C]` or `[1, T, C]` class scores
    ///
    /// Picks the best class per timestep, collapses repeats and drops blanks.
    /// A blank between two equal classes keeps both.
    pub fn decode(&self, scores: &ArrayViewD<'_, f32>) -> Result<String> {
        let shape = scores.shape();
        let (steps, classes, batched) = match *shape {
            [1, t, c] => (t, c, true),
            [t, c] => (t, c, false),
            _ => anyhow::bail!("Unexpected recognition output shape: {:?}", shape),
        };

        let mut text = String::new();
        let mut previous = 0usize;

        for t in 0..steps {
            let mut best = 0usize;
            let mut best_score = f32::NEG_INFINITY;
            for c in 0..classes {
                let score = if batched {
                    scores[IxDyn(&[0, t, c])]
                } else {
                    scores[IxDyn(&[t, c])]
                };
                if score > best_score {
                    best_score = score;
                    best = c;
                }
            }

            if best != previous {
                if let Some(ch) = self.get(best) {
                    text.push(ch);
                }
            }
            previous = best;
        }

        Ok(text.trim().to_string())
    }
}

/// PaddleOCR CTC recognition model
///
/// Runs on the CPU. The session is shared behind a mutex so clones of the
/// recognizer can be handed to worker threads.
#[derive(Clone)]
pub struct OnnxTextRecognizer {
    session: Arc<Mutex<Session>>,
    dictionary: Arc<CharDictionary>,
    input_name: String,
}

impl std::fmt::Debug for OnnxTextRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTextRecognizer")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OnnxTextRecognizer {
    /// Load `rec_model.onnx` and its character dictionary
    ///
    /// # Errors
    /// Returns error if either file is missing or ONNX Runtime fails to
    /// build the session.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, dict_path: Q) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR recognition model not found: {}", model_path.display());
        }
        if !dict_path.exists() {
            anyhow::bail!(
                "OCR character dictionary not found: {}",
                dict_path.display()
            );
        }

        info!(
            "Loading OCR recognition model from {}",
            model_path.display()
        );

        let dictionary = CharDictionary::load(dict_path)?;
        info!(
            "Loaded character dictionary with {} classes",
            dictionary.len()
        );

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!(
                    "Failed to load OCR recognition model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());
        debug!("Recognition model input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }
}

impl TextRecognizer for OnnxTextRecognizer {
    fn recognize(&self, crop: &DynamicImage) -> Result<String> {
        let input = preprocess_for_recognition(crop);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("recognition session lock poisoned"))?;

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Recognition inference failed")?;

        let scores = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract recognition output")?;
        debug!("Recognition output shape: {:?}", scores.shape());

        self.dictionary.decode(&scores.view())
    }
}
