// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::fmt;

use super::pages;
use crate::tts::TtsEngine;

pub const MISSING_FILE_MESSAGE: &str = "Please choose a file before submitting.";
pub const UNSUPPORTED_FILE_MESSAGE: &str = "Unsupported file type. Please upload a PDF or image.";
pub const NOT_FOUND_MESSAGE: &str = "Requested audio file was not found.";

/// Errors surfaced by the web front end
///
/// Form errors re-render the upload page with the message shown above the
/// form.
#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    NotFound(String),
    InternalError(String),
}

impl ApiError {
    pub fn missing_file() -> Self {
        ApiError::InvalidRequest(MISSING_FILE_MESSAGE.to_string())
    }

    pub fn unsupported_file() -> Self {
        ApiError::InvalidRequest(UNSUPPORTED_FILE_MESSAGE.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::InvalidRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalError(msg) => msg,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = pages::upload_form(Some(self.message()), TtsEngine::default());
        (status, Html(body)).into_response()
    }
}
