// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::upload::{
    download_handler, index_handler, listen_handler, result_handler, upload_handler,
};
use crate::pipeline::LecturePipeline;

/// Uploads larger than this are rejected
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LecturePipeline>,
    pub upload_dir: PathBuf,
    pub final_output_dir: PathBuf,
}

impl AppState {
    pub fn new(pipeline: Arc<LecturePipeline>, upload_dir: impl Into<PathBuf>) -> Self {
        let final_output_dir = pipeline.final_output_dir();
        Self {
            pipeline,
            upload_dir: upload_dir.into(),
            final_output_dir,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Upload form and submission
        .route("/", get(index_handler).post(upload_handler))
        .route("/result", get(result_handler))
        .route("/download/*filename", get(download_handler))
        .route("/listen/*filename", get(listen_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Web front end listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    let mut info = crate::version::get_version_info();
    info["status"] = json!("ok");
    Json(info)
}
