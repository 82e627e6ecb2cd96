// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text extraction from uploaded documents
//!
//! PDFs with a text layer are read directly. Images, and PDFs without a text
//! layer, go through OCR page by page. The extracted text is also written to
//! disk so every run leaves its intermediate artifacts behind.

pub mod pdf;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::vision::image_utils::{is_supported_image_extension, load_image, ImageError};
use crate::vision::ocr::OcrEngine;

pub use pdf::{PageRenderer, PdfText, PdfTextExtractor, DEFAULT_RENDER_DPI};

/// Where native PDF text is saved, relative to the output root
pub const PRINTED_TEXT_DIR: &str = "OCR_outputs/printed_text_output";

/// Where OCR text is saved, relative to the output root
pub const OCR_TEXT_DIR: &str = "step_outputs/OCR_outputs";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported input type: {0}")]
    UnsupportedInput(String),

    #[error("{tool} failed: {message}")]
    PdfTool { tool: &'static str, message: String },

    #[error("OCR is not configured; cannot read {0}")]
    OcrUnavailable(PathBuf),

    #[error("OCR failed: {0:#}")]
    Ocr(anyhow::Error),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Kind of input document, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            e if is_supported_image_extension(e) => Ok(Self::Image),
            "" => Err(DocumentError::UnsupportedInput(format!(
                "{} has no extension",
                path.display()
            ))),
            e => Err(DocumentError::UnsupportedInput(format!(".{e}"))),
        }
    }
}

/// How the text was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    PdfText,
    Ocr,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub source: TextSource,
    /// Text artifact on disk, if it could be written
    pub saved_to: Option<PathBuf>,
}

/// Path of the text artifact for a document stem
pub fn text_artifact_path(output_root: &Path, source: TextSource, stem: &str) -> PathBuf {
    let dir = match source {
        TextSource::PdfText => PRINTED_TEXT_DIR,
        TextSource::Ocr => OCR_TEXT_DIR,
    };
    output_root.join(dir).join(format!("{stem}.txt"))
}

/// Write a text artifact, creating parent directories
pub fn save_text(path: &Path, text: &str) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

/// Extracts text from PDFs and images
///
/// Cheap to clone. Extraction is blocking; async callers should run it on
/// the blocking pool.
#[derive(Debug, Clone)]
pub struct DocumentReader {
    pdf_text: PdfTextExtractor,
    renderer: PageRenderer,
    ocr: Option<Arc<OcrEngine>>,
    output_root: PathBuf,
}

impl DocumentReader {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            pdf_text: PdfTextExtractor::default(),
            renderer: PageRenderer::default(),
            ocr: None,
            output_root: output_root.into(),
        }
    }

    pub fn with_ocr(mut self, engine: Arc<OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    pub fn with_pdf_text(mut self, extractor: PdfTextExtractor) -> Self {
        self.pdf_text = extractor;
        self
    }

    pub fn with_renderer(mut self, renderer: PageRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract the text of `path` and save it as an artifact
    ///
    /// A failure to save is logged and leaves `saved_to` empty.
    pub fn extract(&self, path: &Path) -> Result<ExtractedText, DocumentError> {
        if !path.is_file() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }
        let kind = InputKind::from_path(path)?;
        info!("Extracting text from {} ({:?})", path.display(), kind);

        let (text, source) = match kind {
            InputKind::Pdf => self.read_pdf(path)?,
            InputKind::Image => (self.ocr_image(path)?, TextSource::Ocr),
        };

        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("document");
        let artifact = text_artifact_path(&self.output_root, source, stem);
        let saved_to = match save_text(&artifact, &text) {
            Ok(()) => {
                info!("Text saved to {}", artifact.display());
                Some(artifact)
            }
            Err(e) => {
                warn!("Could not save text to {}: {}", artifact.display(), e);
                None
            }
        };

        Ok(ExtractedText {
            text,
            source,
            saved_to,
        })
    }

    fn read_pdf(&self, path: &Path) -> Result<(String, TextSource), DocumentError> {
        let pdf_text = self.pdf_text.extract(path)?;
        if pdf_text.has_text() {
            return Ok((pdf_text.joined(), TextSource::PdfText));
        }

        info!(
            "{} has no text layer; falling back to OCR",
            path.display()
        );
        let engine = self
            .ocr
            .as_ref()
            .ok_or_else(|| DocumentError::OcrUnavailable(path.to_path_buf()))?;

        let scratch = tempfile::tempdir()?;
        let pages = self.renderer.render_all(path, scratch.path())?;

        let mut texts = Vec::with_capacity(pages.len());
        for page in &pages {
            let image = load_image(page)?;
            let result = engine.recognize_page(&image).map_err(DocumentError::Ocr)?;
            texts.push(result.text);
        }
        Ok((texts.join("\n").trim().to_string(), TextSource::Ocr))
    }

    fn ocr_image(&self, path: &Path) -> Result<String, DocumentError> {
        let engine = self
            .ocr
            .as_ref()
            .ok_or_else(|| DocumentError::OcrUnavailable(path.to_path_buf()))?;
        let page = engine.recognize_path(path).map_err(DocumentError::Ocr)?;
        Ok(page.text)
    }
}
