// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CPU-based image processing
//!
//! - `ocr` - text detection, line grouping and recognition
//! - `image_utils` - decoding and format detection

pub mod image_utils;
pub mod ocr;

pub use image_utils::{
    decode_image_bytes, detect_format, is_supported_image_extension, load_image, ImageError,
    ImageInfo,
};
