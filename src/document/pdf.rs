// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF helpers backed by poppler-utils (`pdftotext`, `pdftoppm`)

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::DocumentError;

/// Default rendering resolution for scanned pages
pub const DEFAULT_RENDER_DPI: u32 = 200;

/// Text of a PDF, one entry per page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfText {
    pub pages: Vec<String>,
}

impl PdfText {
    /// Split `pdftotext` output on form feeds
    pub fn from_pdftotext_output(stdout: &str) -> Self {
        let mut pages: Vec<String> = stdout
            .split('\x0c')
            .map(|page| page.trim().to_string())
            .collect();
        // pdftotext terminates the last page with a form feed too
        if pages.last().is_some_and(|page| page.is_empty()) {
            pages.pop();
        }
        Self { pages }
    }

    /// Whether any page carries a text layer
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|page| !page.is_empty())
    }

    /// Non-empty pages joined with newlines
    pub fn joined(&self) -> String {
        self.pages
            .iter()
            .filter(|page| !page.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

/// Runs `pdftotext -layout <pdf> -`
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    program: PathBuf,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdftotext"),
        }
    }
}

impl PdfTextExtractor {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn extract(&self, pdf_path: &Path) -> Result<PdfText, DocumentError> {
        let output = Command::new(&self.program)
            .arg("-layout")
            .arg(pdf_path)
            .arg("-")
            .output()
            .map_err(|e| DocumentError::PdfTool {
                tool: "pdftotext",
                message: format!("failed to invoke: {e}; is poppler-utils installed?"),
            })?;

        if !output.status.success() {
            return Err(DocumentError::PdfTool {
                tool: "pdftotext",
                message: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let text = PdfText::from_pdftotext_output(&String::from_utf8_lossy(&output.stdout));
        debug!(
            "pdftotext read {} pages from {}",
            text.pages.len(),
            pdf_path.display()
        );
        Ok(text)
    }
}

/// Renders every page of a PDF to PNG with `pdftoppm`
#[derive(Debug, Clone)]
pub struct PageRenderer {
    program: PathBuf,
    dpi: u32,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_DPI)
    }
}

impl PageRenderer {
    pub fn new(dpi: u32) -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
            dpi,
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Render into `out_dir`, returning page images in page order
    pub fn render_all(
        &self,
        pdf_path: &Path,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, DocumentError> {
        fs::create_dir_all(out_dir)?;
        let prefix = out_dir.join("page");

        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| DocumentError::PdfTool {
                tool: "pdftoppm",
                message: format!("failed to invoke: {e}; is poppler-utils installed?"),
            })?;

        if !output.status.success() {
            return Err(DocumentError::PdfTool {
                tool: "pdftoppm",
                message: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let pages = rendered_pages(out_dir)?;
        debug!(
            "pdftoppm rendered {} pages at {} dpi",
            pages.len(),
            self.dpi
        );
        Ok(pages)
    }
}

/// `page-N.png` files in `dir`, ordered by page number
///
/// pdftoppm zero-pads the page number to a common width, but the number is
/// parsed anyway so ordering does not depend on that.
pub fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let mut pages = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let number = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("page-"))
            .and_then(|rest| rest.strip_suffix(".png"))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(number) = number {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}
