// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Rectangles derived from detection polygons
//!
//! Detection models return polygons in image pixel space (origin top-left).
//! Everything downstream of detection works on axis-aligned rectangles.

use serde::{Deserialize, Serialize};

/// Regions narrower or shorter than this (in pixels) are treated as noise
pub const MIN_REGION_SIZE: f32 = 10.0;

/// Padding added around a line before cropping it for recognition
pub const LINE_CROP_PADDING: f32 = 5.0;

/// Polygon vertices as `[x, y]` pairs
pub type Polygon = Vec<[f32; 2]>;

/// Axis-aligned rectangle around one detected text region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl DetectedRegion {
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Reduce a polygon to its min/max rectangle
    ///
    /// Returns `None` for an empty polygon or one with non-finite coordinates.
    pub fn from_polygon(points: &[[f32; 2]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut region = Self::new(first[0], first[1], first[0], first[1]);

        for [x, y] in rest {
            region.x_min = region.x_min.min(*x);
            region.y_min = region.y_min.min(*y);
            region.x_max = region.x_max.max(*x);
            region.y_max = region.y_max.max(*y);
        }

        let finite = [region.x_min, region.y_min, region.x_max, region.y_max]
            .iter()
            .all(|v| v.is_finite());
        finite.then_some(region)
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Vertical center, `y_min + height / 2`
    pub fn center_y(&self) -> f32 {
        self.y_min + self.height() / 2.0
    }

    /// Whether both dimensions reach [`MIN_REGION_SIZE`]
    pub fn meets_min_size(&self) -> bool {
        self.width() >= MIN_REGION_SIZE && self.height() >= MIN_REGION_SIZE
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// Flatten detection polygons into rectangles, dropping undersized ones
///
/// Degenerate polygons (no vertices) are skipped as well.
pub fn regions_from_polygons<'a, I>(polygons: I) -> Vec<DetectedRegion>
where
    I: IntoIterator<Item = &'a Polygon>,
{
    polygons
        .into_iter()
        .filter_map(|polygon| DetectedRegion::from_polygon(polygon))
        .filter(DetectedRegion::meets_min_size)
        .collect()
}

/// Integer pixel rectangle used to crop the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropBox {
    /// Pad `bounds` on every side and clamp to an image of the given size
    ///
    /// Returns `None` when nothing of the padded box lies inside the image.
    pub fn around(
        bounds: &DetectedRegion,
        padding: f32,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        let x0 = (bounds.x_min - padding).floor().max(0.0);
        let y0 = (bounds.y_min - padding).floor().max(0.0);
        let x1 = (bounds.x_max + padding).ceil().min(image_width as f32);
        let y1 = (bounds.y_max + padding).ceil().min(image_height as f32);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}
