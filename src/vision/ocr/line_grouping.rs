// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reading-order line grouping for detected text regions
//!
//! Text detection returns word or glyph-cluster boxes with no line
//! association. Lines are rebuilt in a single pass over the boxes sorted by
//! their top edge: each line is anchored on its first box, and a later box
//! joins the line while its vertical center stays above
//! `anchor_center + 0.5 * anchor_height`. The anchor is never recentered, so
//! a tall first box gives its line a generous tolerance.

use super::geometry::DetectedRegion;

/// Fraction of the anchor height a box center may sit below the anchor center
const LINE_TOLERANCE: f32 = 0.5;

/// Regions judged to lie on one horizontal text line, left to right
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    anchor: DetectedRegion,
    regions: Vec<DetectedRegion>,
}

impl TextLine {
    fn start(anchor: DetectedRegion) -> Self {
        Self {
            anchor,
            regions: vec![anchor],
        }
    }

    fn accepts(&self, region: &DetectedRegion) -> bool {
        region.center_y() < self.anchor.center_y() + LINE_TOLERANCE * self.anchor.height()
    }

    /// The first region assigned to this line
    pub fn anchor(&self) -> &DetectedRegion {
        &self.anchor
    }

    /// Regions sorted by `x_min`
    pub fn regions(&self) -> &[DetectedRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Bounding box of every region on the line
    pub fn bounds(&self) -> DetectedRegion {
        self.regions
            .iter()
            .fold(self.anchor, |acc, region| acc.union(region))
    }

    pub fn into_regions(self) -> Vec<DetectedRegion> {
        self.regions
    }
}

/// Group regions into lines in top-to-bottom, left-to-right reading order
///
/// The input order does not matter; regions are re-sorted by `y_min` first.
/// Callers are expected to have dropped undersized regions already (see
/// [`regions_from_polygons`](super::geometry::regions_from_polygons)).
pub fn group_lines(regions: impl IntoIterator<Item = DetectedRegion>) -> Vec<TextLine> {
    let mut sorted: Vec<DetectedRegion> = regions.into_iter().collect();
    sorted.sort_by(|a, b| a.y_min.total_cmp(&b.y_min));

    let mut lines = Vec::new();
    let mut current: Option<TextLine> = None;

    for region in sorted {
        match current.as_mut() {
            Some(line) if line.accepts(&region) => line.regions.push(region),
            _ => {
                if let Some(done) = current.replace(TextLine::start(region)) {
                    lines.push(done);
                }
            }
        }
    }
    lines.extend(current);

    for line in &mut lines {
        line.regions.sort_by(|a, b| a.x_min.total_cmp(&b.x_min));
    }

    lines
}
