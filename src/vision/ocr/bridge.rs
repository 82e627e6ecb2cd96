// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! External text detector invoked as a subprocess
//!
//! The command receives the page image path as its last argument and prints
//! a JSON array of polygons on stdout, e.g.
//! `[[[12, 40], [80, 35], [82, 60], [10, 62]], ...]`.

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::detection::TextDetector;
use super::geometry::Polygon;

#[derive(Debug, Clone)]
pub struct ScriptTextDetector {
    program: PathBuf,
    args: Vec<String>,
}

impl ScriptTextDetector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Parse a whitespace-separated command line such as
    /// `python3 tools/craft_detect.py --cuda false`
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .context("detector command is empty")?;
        Ok(Self {
            program: PathBuf::from(program),
            args: parts.map(str::to_string).collect(),
        })
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the detector on an image already on disk
    pub fn detect_path(&self, image_path: &Path) -> Result<Vec<Polygon>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .output()
            .with_context(|| {
                format!("failed to invoke detector {}", self.program.display())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("detector exited with {}: {}", output.status, stderr.trim());
        }

        let polygons = parse_polygons(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            "{} returned {} polygons",
            self.program.display(),
            polygons.len()
        );
        Ok(polygons)
    }
}

impl TextDetector for ScriptTextDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Polygon>> {
        let scratch = tempfile::Builder::new()
            .prefix("page-")
            .suffix(".png")
            .tempfile()
            .context("failed to create scratch image")?;
        image
            .save_with_format(scratch.path(), ImageFormat::Png)
            .context("failed to write scratch image")?;
        self.detect_path(scratch.path())
    }
}

/// Parse detector stdout into polygons
pub fn parse_polygons(stdout: &str) -> Result<Vec<Polygon>> {
    serde_json::from_str(stdout.trim()).context("failed to parse detector JSON output")
}
