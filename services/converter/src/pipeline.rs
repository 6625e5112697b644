//! Two-pass GIF encoding
//!
//! The first pass computes a palette for the scaled clip, the second encodes
//! the GIF against it. The palette file belongs to a single conversion and
//! is removed when the conversion ends, whatever the outcome.

use std::path::{Path, PathBuf};

use chrono::Local;
use common::process::{CommandSpec, FfmpegCommand, ProcessOutput, ProcessRunner};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::ConversionRequest;

/// Reasons a conversion can fail
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Palette generation failed")]
    PaletteGenerationFailed,

    #[error("GIF encoding failed")]
    GifEncodingFailed,

    #[error("Unexpected conversion error: {0}")]
    Unexpected(String),
}

/// Path of the produced GIF, or why there is none
pub type ConversionResult = Result<PathBuf, ConversionError>;

/// Palette image scoped to one conversion; deleted on drop
#[derive(Debug)]
pub struct PaletteArtifact {
    path: PathBuf,
}

impl PaletteArtifact {
    /// Reserve a unique `palette_<timestamp>_<id>.png` name inside `dir`
    pub fn new(dir: &Path) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        let name = format!(
            "palette_{}_{}.png",
            Local::now().format("%Y%m%d_%H%M%S"),
            &id[..8]
        );
        Self {
            path: dir.join(name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PaletteArtifact {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Failed to remove palette {}: {}", self.path.display(), e);
            }
        }
    }
}

pub struct ConversionPipeline<'a> {
    runner: &'a dyn ProcessRunner,
    ffmpeg_path: &'a str,
}

impl<'a> ConversionPipeline<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, ffmpeg_path: &'a str) -> Self {
        Self {
            runner,
            ffmpeg_path,
        }
    }

    pub async fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        info!(
            "Converting {} to {} at {} / {} fps",
            request.input.display(),
            request.output.display(),
            request.size,
            request.frame_rate
        );

        if !request.input.is_file() {
            error!("Source file missing: {}", request.input.display());
            return Err(ConversionError::Unexpected(
                "source file is missing".to_string(),
            ));
        }

        let work_dir = request
            .output
            .parent()
            .ok_or_else(|| ConversionError::Unexpected("output path has no parent".to_string()))?;
        let palette = PaletteArtifact::new(work_dir);

        let result = self.run_passes(request, palette.path()).await;
        if result.is_err() && request.output.exists() {
            // ffmpeg may leave a truncated file behind
            if let Err(e) = std::fs::remove_file(&request.output) {
                warn!(
                    "Failed to remove partial output {}: {}",
                    request.output.display(),
                    e
                );
            }
        }
        result
    }

    async fn run_passes(&self, request: &ConversionRequest, palette: &Path) -> ConversionResult {
        let palette_cmd = FfmpegCommand::palette(
            self.ffmpeg_path,
            &request.input,
            palette,
            request.size,
            request.frame_rate,
        );
        let output = self.run_step(&palette_cmd).await?;
        if !output.success {
            error!("Palette generation failed: {}", output.stderr_lossy());
            return Err(ConversionError::PaletteGenerationFailed);
        }

        let gif_cmd = FfmpegCommand::paletteuse(
            self.ffmpeg_path,
            &request.input,
            palette,
            &request.output,
            request.size,
            request.frame_rate,
        );
        let output = self.run_step(&gif_cmd).await?;
        if !output.success {
            error!("GIF encoding failed: {}", output.stderr_lossy());
            return Err(ConversionError::GifEncodingFailed);
        }

        if !request.output.is_file() {
            return Err(ConversionError::Unexpected(
                "encoder reported success but wrote no file".to_string(),
            ));
        }

        Ok(request.output.clone())
    }

    async fn run_step(&self, spec: &CommandSpec) -> Result<ProcessOutput, ConversionError> {
        self.runner.run(spec).await.map_err(|e| {
            error!("Encoder invocation failed: {}", e);
            ConversionError::Unexpected(e.to_string())
        })
    }
}
