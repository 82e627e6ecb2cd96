// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload, result and audio download handlers

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{ApiError, NOT_FOUND_MESSAGE};
use super::http_server::AppState;
use super::pages;
use crate::document::InputKind;
use crate::tts::TtsEngine;

/// GET / - upload form
pub async fn index_handler() -> Html<String> {
    Html(pages::upload_form(None, TtsEngine::default()))
}

struct UploadForm {
    file_name: String,
    data: Bytes,
    engine: TtsEngine,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut document: Option<(String, Bytes)> = None;
    let mut engine = TtsEngine::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed upload: {}", e);
        ApiError::InvalidRequest(format!("Malformed upload: {}", e))
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("document") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Upload interrupted: {}", e)))?;
                document = Some((file_name, data));
            }
            Some("tts") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Malformed upload: {}", e)))?;
                if !value.trim().is_empty() {
                    engine = value.trim().parse().map_err(ApiError::InvalidRequest)?;
                }
            }
            other => debug!("Ignoring form field {:?}", other),
        }
    }

    match document {
        Some((file_name, data)) if !file_name.is_empty() && !data.is_empty() => Ok(UploadForm {
            file_name,
            data,
            engine,
        }),
        _ => Err(ApiError::missing_file()),
    }
}

/// POST / - store the upload, run the pipeline, redirect to the result
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let form = read_form(multipart).await?;

    let original = Path::new(&form.file_name);
    if InputKind::from_path(original).is_err() {
        warn!("Rejected upload with unsupported type: {}", form.file_name);
        return Err(ApiError::unsupported_file());
    }
    let extension = original
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let job_id = Uuid::new_v4().simple().to_string();
    let saved_path = state.upload_dir.join(format!("{}.{}", job_id, extension));
    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::InternalError(format!("Could not store upload: {}", e)))?;
    tokio::fs::write(&saved_path, &form.data)
        .await
        .map_err(|e| ApiError::InternalError(format!("Could not store upload: {}", e)))?;
    info!(
        "Job {}: stored {} ({} bytes) as {}",
        job_id,
        form.file_name,
        form.data.len(),
        saved_path.display()
    );

    let artifacts = state
        .pipeline
        .run(&saved_path, form.engine, Some(&job_id))
        .await
        .map_err(|e| {
            warn!("Job {} failed: {}", job_id, e);
            ApiError::InternalError(e.to_string())
        })?;

    info!("Job {} finished: {}", job_id, artifacts.audio_path.display());
    Ok(Redirect::to(&format!(
        "/result?job_id={}&audio_filename={}",
        job_id, artifacts.audio_filename
    )))
}

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub job_id: Option<String>,
    pub audio_filename: Option<String>,
}

/// GET /result - audio player for a finished job
pub async fn result_handler(
    State(state): State<AppState>,
    Query(query): Query<ResultQuery>,
) -> Response {
    let (Some(job_id), Some(audio_filename)) = (
        query.job_id.filter(|v| !v.is_empty()),
        query.audio_filename.filter(|v| !v.is_empty()),
    ) else {
        debug!("Result page requested without job information");
        return Redirect::to("/").into_response();
    };

    match audio_path(&state.final_output_dir, &audio_filename) {
        Some(path) if path.is_file() => {
            Html(pages::result_page(&job_id, &audio_filename)).into_response()
        }
        _ => {
            debug!("Audio for job {} is no longer available", job_id);
            Redirect::to("/").into_response()
        }
    }
}

/// Resolve a requested file name inside `dir`, keeping only its final
/// component
pub fn audio_path(dir: &Path, requested: &str) -> Option<PathBuf> {
    let name = Path::new(requested).file_name()?;
    Some(dir.join(name))
}

/// MIME type of a generated audio file
pub fn audio_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

async fn read_audio(state: &AppState, requested: &str) -> Result<(PathBuf, Vec<u8>), ApiError> {
    let path = audio_path(&state.final_output_dir, requested)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;
    match tokio::fs::read(&path).await {
        Ok(data) => Ok((path, data)),
        Err(e) => {
            debug!("Audio {} not readable: {}", path.display(), e);
            Err(ApiError::NotFound(NOT_FOUND_MESSAGE.to_string()))
        }
    }
}

/// GET /download/*filename - audio as an attachment
pub async fn download_handler(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, ApiError> {
    let (path, data) = read_audio(&state, &filename).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_default();
    Ok((
        [
            (header::CONTENT_TYPE, audio_content_type(&path).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        data,
    )
        .into_response())
}

/// GET /listen/*filename - audio for the inline player
pub async fn listen_handler(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, ApiError> {
    let (path, data) = read_audio(&state, &filename).await?;
    Ok(([(header::CONTENT_TYPE, audio_content_type(&path))], data).into_response())
}
