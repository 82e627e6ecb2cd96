// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tensor preprocessing for the ONNX detection and recognition models

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Square input side of the detection model
pub const DET_INPUT_SIZE: u32 = 640;

/// Input height of the recognition model
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Widest crop the recognition model accepts
pub const REC_MAX_WIDTH: u32 = 320;

/// Narrowest crop the recognition model accepts
pub const REC_MIN_WIDTH: u32 = 4;

/// ImageNet channel means
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Gray used to pad the letterboxed detection input
const PAD_GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// Letterbox an image onto the detection canvas and build an NCHW tensor
///
/// Returns the tensor together with the mapping needed to bring detections
/// back into the original image space.
pub fn preprocess_for_detection(image: &DynamicImage) -> (Array4<f32>, PreprocessInfo) {
    let info = PreprocessInfo::new(image, DET_INPUT_SIZE);
    let canvas = letterbox(image, &info, DET_INPUT_SIZE);
    (to_normalized_tensor(&canvas), info)
}

/// Resize a line crop to the recognition height and build an NCHW tensor
///
/// The aspect ratio is kept; the width is clamped to
/// `[REC_MIN_WIDTH, REC_MAX_WIDTH]`.
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let scale = REC_INPUT_HEIGHT as f32 / height.max(1) as f32;
    let target_width = ((width as f32 * scale).round() as u32).clamp(REC_MIN_WIDTH, REC_MAX_WIDTH);

    let resized = image
        .resize_exact(target_width, REC_INPUT_HEIGHT, FilterType::Lanczos3)
        .to_rgb8();
    to_normalized_tensor(&resized)
}

fn letterbox(image: &DynamicImage, info: &PreprocessInfo, target_size: u32) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(target_size, target_size, PAD_GRAY);
    if info.original_width == 0 || info.original_height == 0 {
        return canvas;
    }

    let resized = image
        .resize_exact(info.scaled_width, info.scaled_height, FilterType::Lanczos3)
        .to_rgb8();
    image::imageops::replace(
        &mut canvas,
        &resized,
        i64::from(info.offset_x),
        i64::from(info.offset_y),
    );
    canvas
}

/// `(pixel / 255 - mean) / std`, laid out as `[1, 3, H, W]`
fn to_normalized_tensor(rgb: &RgbImage) -> Array4<f32> {
    let (width, height) = rgb.dimensions();
    let mut tensor = Array4::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (f32::from(pixel[c]) / 255.0 - MEAN[c]) / STD[c];
        }
    }

    tensor
}

/// Scale and padding applied while letterboxing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessInfo {
    pub scale: f32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl PreprocessInfo {
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                scaled_width: 0,
                scaled_height: 0,
                original_width: width,
                original_height: height,
            };
        }

        let scale = (target_size as f32 / width as f32).min(target_size as f32 / height as f32);
        let scaled_width = ((width as f32 * scale).round() as u32).clamp(1, target_size);
        let scaled_height = ((height as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            offset_x: (target_size - scaled_width) / 2,
            offset_y: (target_size - scaled_height) / 2,
            scaled_width,
            scaled_height,
            original_width: width,
            original_height: height,
        }
    }

    /// Map a point on the letterboxed canvas back into the original image,
    /// clamped to its bounds
    pub fn map_to_original(&self, x: f32, y: f32) -> [f32; 2] {
        let orig_x = (x - self.offset_x as f32) / self.scale;
        let orig_y = (y - self.offset_y as f32) / self.scale;
        [
            orig_x.clamp(0.0, self.original_width as f32),
            orig_y.clamp(0.0, self.original_height as f32),
        ]
    }
}
