// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text region detection
//!
//! [`TextDetector`] is the seam to whatever model finds text on a page. The
//! bundled implementation runs a PaddleOCR DB detection model through ONNX
//! Runtime on the CPU.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use ndarray::{ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::geometry::Polygon;
use super::preprocessing::{preprocess_for_detection, PreprocessInfo};

/// Default probability above which a pixel counts as text
pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.3;

/// Connected components with this many pixels or fewer are ignored
const MIN_COMPONENT_PIXELS: usize = 10;

/// Finds text regions on a page image
#[cfg_attr(test, mockall::automock)]
pub trait TextDetector: Send + Sync {
    /// Polygons around text regions, in the pixel space of `image`
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Polygon>>;
}

/// PaddleOCR DB text detection model
#[derive(Clone)]
pub struct OnnxTextDetector {
    session: Arc<Mutex<Session>>,
    input_name: String,
    threshold: f32,
}

impl std::fmt::Debug for OnnxTextDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTextDetector")
            .field("input_name", &self.input_name)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl OnnxTextDetector {
    /// Load the detection model (`det_model.onnx`)
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            anyhow::bail!("OCR detection model not found: {}", model_path.display());
        }

        info!("Loading OCR detection model from {}", model_path.display());

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
                    "Failed to load OCR detection model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());
        debug!("Detection model input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            threshold: DEFAULT_DETECTION_THRESHOLD,
        })
    }
}

impl TextDetector for OnnxTextDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Polygon>> {
        let (input, info) = preprocess_for_detection(image);
        let (input_height, input_width) = (input.shape()[2], input.shape()[3]);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("detection session lock poisoned"))?;

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let probabilities = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract detection output")?;

        let map = ProbabilityMap::from_output(probabilities.view())?;
        let polygons = map
            .components(self.threshold)
            .into_iter()
            .map(|component| component.to_polygon(&map, input_width, input_height, &info))
            .collect::<Vec<_>>();

        debug!("Detected {} text regions", polygons.len());
        Ok(polygons)
    }
}

/// Detection output viewed as a 2-D probability map
pub(crate) struct ProbabilityMap<'a> {
    data: ArrayViewD<'a, f32>,
    height: usize,
    width: usize,
}

impl<'a> ProbabilityMap<'a> {
    /// Accepts `[1, 1, H, W]` or `[1, H, W]`
    pub(crate) fn from_output(data: ArrayViewD<'a, f32>) -> Result<Self> {
        let shape = data.shape().to_vec();
        let (height, width) = match shape.as_slice() {
            [1, 1, h, w] | [1, h, w] => (*h, *w),
            _ => anyhow::bail!("Unexpected detection output shape: {:?}", shape),
        };
        let data = data
            .into_shape_with_order(IxDyn(&[height, width]))
            .context("Failed to reshape detection output")?;
        Ok(Self {
            data,
            height,
            width,
        })
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[IxDyn(&[y, x])]
    }

    /// 4-connected components of pixels at or above `threshold`
    pub(crate) fn components(&self, threshold: f32) -> Vec<Component> {
        let mut visited = vec![false; self.width * self.height];
        let mut components = Vec::new();

        for y in 0..self.height {
            for x in 0..self.width {
                if visited[y * self.width + x] || self.at(x, y) < threshold {
                    continue;
                }
                let component = self.flood_fill(x, y, threshold, &mut visited);
                if component.pixels > MIN_COMPONENT_PIXELS {
                    components.push(component);
                }
            }
        }

        components
    }

    fn flood_fill(
        &self,
        start_x: usize,
        start_y: usize,
        threshold: f32,
        visited: &mut [bool],
    ) -> Component {
        let mut component = Component {
            min_x: start_x,
            max_x: start_x,
            min_y: start_y,
            max_y: start_y,
            pixels: 0,
        };
        let mut stack = vec![(start_x, start_y)];

        while let Some((x, y)) = stack.pop() {
            let idx = y * self.width + x;
            if visited[idx] || self.at(x, y) < threshold {
                continue;
            }
            visited[idx] = true;
            component.pixels += 1;
            component.min_x = component.min_x.min(x);
            component.max_x = component.max_x.max(x);
            component.min_y = component.min_y.min(y);
            component.max_y = component.max_y.max(y);

            if x > 0 {
                stack.push((x - 1, y));
            }
            if x + 1 < self.width {
                stack.push((x + 1, y));
            }
            if y > 0 {
                stack.push((x, y - 1));
            }
            if y + 1 < self.height {
                stack.push((x, y + 1));
            }
        }

        component
    }
}

/// Bounding box of one connected text component, in probability-map cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Component {
    pub min_x: usize,
    pub max_x: usize,
    pub min_y: usize,
    pub max_y: usize,
    pub pixels: usize,
}

impl Component {
    /// Corners in original image space, clockwise from top-left
    fn to_polygon(
        &self,
        map: &ProbabilityMap<'_>,
        input_width: usize,
        input_height: usize,
        info: &PreprocessInfo,
    ) -> Polygon {
        let scale_x = input_width as f32 / map.width as f32;
        let scale_y = input_height as f32 / map.height as f32;

        let left = self.min_x as f32 * scale_x;
        let right = (self.max_x + 1) as f32 * scale_x;
        let top = self.min_y as f32 * scale_y;
        let bottom = (self.max_y + 1) as f32 * scale_y;

        vec![
            info.map_to_original(left, top),
            info.map_to_original(right, top),
            info.map_to_original(right, bottom),
            info.map_to_original(left, bottom),
        ]
    }
}
