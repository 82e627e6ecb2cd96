// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{start_server, AppState};
use crate::config::PipelineConfig;
use crate::document::{save_text, text_artifact_path, TextSource};
use crate::lecture::OllamaClient;
use crate::pipeline::LecturePipeline;
use crate::tts::TtsEngine;
use crate::vision::ocr::OcrEngine;

/// Lecture Synth CLI
#[derive(Parser, Debug)]
#[command(name = "lecture-synth")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Turn lecture notes into narrated audio", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a PDF or image into a narrated lecture
    Run(RunArgs),

    /// Print the text found in an image
    Ocr(OcrArgs),

    /// Start the web front end
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Input PDF or image file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Text-to-speech engine
    #[arg(short, long, value_enum, default_value_t = TtsEngine::ElevenLabsV2)]
    pub tts: TtsEngine,
}

#[derive(clap::Args, Debug)]
pub struct OcrArgs {
    /// Page image to read
    pub image: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides LECTURE_BIND)
    #[arg(long)]
    pub bind: Option<String>,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = PipelineConfig::from_env();
    match cli.command {
        Commands::Run(args) => run(&config, args).await,
        Commands::Ocr(args) => ocr(&config, args).await,
        Commands::Serve(args) => serve(config, args).await,
    }
}

async fn run(config: &PipelineConfig, args: RunArgs) -> Result<()> {
    let pipeline = LecturePipeline::from_config(config)?;
    let artifacts = pipeline.run(&args.input, args.tts, None).await?;

    if let Some(path) = &artifacts.text_path {
        println!("Extracted text: {}", path.display());
    }
    if let Some(path) = &artifacts.script_path {
        println!("Lecture script: {}", path.display());
    }
    println!("Audio: {}", artifacts.audio_path.display());
    Ok(())
}

async fn ocr(config: &PipelineConfig, args: OcrArgs) -> Result<()> {
    if !args.image.is_file() {
        bail!("Image not found: {}", args.image.display());
    }
    if !config.has_ocr_models() {
        bail!(
            "OCR models not found in {}",
            config.ocr.model_dir.display()
        );
    }

    let model_dir = config.ocr.model_dir.clone();
    let detector_command = config.ocr.detector_command.clone();
    let image = args.image.clone();
    let page = tokio::task::spawn_blocking(move || {
        let engine = OcrEngine::from_model_dir(&model_dir, detector_command.as_deref())?;
        engine.recognize_path(&image)
    })
    .await??;

    println!("{}", page.text);

    let stem = args
        .image
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("page");
    let artifact = text_artifact_path(&config.output_root, TextSource::Ocr, stem);
    save_text(&artifact, &page.text)
        .with_context(|| format!("Failed to save {}", artifact.display()))?;
    eprintln!("Saved to {}", artifact.display());
    Ok(())
}

async fn serve(config: PipelineConfig, args: ServeArgs) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.bind_addr.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", bind))?;

    let ollama = OllamaClient::new(&config.ollama.host, &config.ollama.model)?;
    if !ollama.health_check().await {
        warn!(
            "Ollama is not reachable at {}; uploads will fail until it is",
            ollama.endpoint()
        );
    }

    let pipeline = Arc::new(LecturePipeline::from_config(&config)?);
    info!(
        "Writing artifacts under {} (engines: {:?})",
        pipeline.output_root().display(),
        pipeline.available_engines()
    );
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let state = AppState::new(pipeline, &config.upload_dir);

    start_server(state, addr).await
}
