//! Per-request upload → validate → probe → resolve → convert → respond flow

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::Multipart,
    http::header,
    response::Response,
};
use chrono::Local;
use common::config::ConverterConfig;
use common::process::{FrameSize, ProcessRunner};
use futures::Stream;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{ConversionOptions, ConversionRequest, ConvertedGif, UploadedMedia};
use crate::pipeline::ConversionPipeline;
use crate::probe::MediaProbe;
use crate::resolution::ParameterResolver;
use crate::upload::{RequestWorkspace, receive_upload};
use crate::validation::validate_duration;

/// Response body that keeps the request workspace alive until sent
struct WorkspaceStream<S> {
    inner: S,
    _workspace: RequestWorkspace,
}

impl<S: Stream + Unpin> Stream for WorkspaceStream<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

#[derive(Clone)]
pub struct GifWorkflow {
    config: Arc<ConverterConfig>,
    runner: Arc<dyn ProcessRunner>,
}

impl GifWorkflow {
    pub fn new(config: Arc<ConverterConfig>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    /// Run the whole request and build the GIF response
    pub async fn handle(&self, multipart: Multipart) -> ApiResult<Response> {
        let workspace = RequestWorkspace::create(&self.config.work_dir).map_err(|e| {
            error!(
                "Failed to create work directory in {}: {}",
                self.config.work_dir.display(),
                e
            );
            ApiError::InternalError
        })?;

        let (media, options) =
            receive_upload(multipart, &workspace, self.config.max_upload_bytes).await?;
        let gif = self.convert(&media, &options, &workspace).await?;

        if let Err(e) = tokio::fs::remove_file(&media.path).await {
            warn!("Failed to remove upload {}: {}", media.path.display(), e);
        }

        Self::respond(gif, workspace).await
    }

    /// Probe, check duration, resolve the target size and encode
    pub async fn convert(
        &self,
        media: &UploadedMedia,
        options: &ConversionOptions,
        workspace: &RequestWorkspace,
    ) -> ApiResult<ConvertedGif> {
        let metadata = MediaProbe::new(self.runner.as_ref(), &self.config.ffprobe_path)
            .probe(&media.path)
            .await;
        let metadata = validate_duration(metadata, self.config.max_duration_secs)?;
        info!(
            "Probed {} ({} bytes): {:.2}s, native size {:?}",
            media.safe_filename, media.size_bytes, metadata.duration, metadata.size
        );

        let default_size = FrameSize::new(self.config.default_width, self.config.default_height);
        let size = ParameterResolver::new(default_size).resolve(options, metadata.size);

        let download_name = format!(
            "{}_{}.gif",
            media.stem(),
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let request = ConversionRequest {
            input: media.path.clone(),
            output: workspace.path().join(&download_name),
            size,
            frame_rate: self.config.frame_rate,
        };

        let path = ConversionPipeline::new(self.runner.as_ref(), &self.config.ffmpeg_path)
            .convert(&request)
            .await?;
        info!("Converted {} to {} at {}", media.original_filename, download_name, size);

        Ok(ConvertedGif {
            path,
            download_name,
        })
    }

    /// Stream the GIF back; the workspace is dropped once the body is done
    pub async fn respond(gif: ConvertedGif, workspace: RequestWorkspace) -> ApiResult<Response> {
        let file = tokio::fs::File::open(&gif.path).await.map_err(|e| {
            error!("Failed to open {}: {}", gif.path.display(), e);
            ApiError::SendFailed
        })?;
        let length = file.metadata().await.map(|m| m.len()).map_err(|e| {
            error!("Failed to stat {}: {}", gif.path.display(), e);
            ApiError::SendFailed
        })?;

        let stream = WorkspaceStream {
            inner: ReaderStream::new(file),
            _workspace: workspace,
        };

        Response::builder()
            .header(header::CONTENT_TYPE, "image/gif")
            .header(header::CONTENT_LENGTH, length)
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", gif.download_name),
            )
            .body(Body::from_stream(stream))
            .map_err(|e| {
                error!("Failed to build GIF response: {}", e);
                ApiError::SendFailed
            })
    }
}
