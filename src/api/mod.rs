// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod http_server;
pub mod pages;
pub mod upload;

pub use errors::ApiError;
pub use http_server::{create_router, start_server, AppState, MAX_UPLOAD_BYTES};
