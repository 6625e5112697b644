//! Multipart intake and per-request scratch space

use std::path::Path;

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{ConversionOptions, UploadedMedia};
use crate::validation::{sanitize_filename, validate_filename};

/// Form fields that may carry the video
pub const FILE_FIELDS: &[&str] = &["file", "video"];

/// Scratch directory owning every file of one request
///
/// The directory and whatever is left in it are removed on drop.
#[derive(Debug)]
pub struct RequestWorkspace {
    dir: TempDir,
}

impl RequestWorkspace {
    pub fn create(root: &Path) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("gifconv-")
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn multipart_error(err: MultipartError, limit_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge {
            limit_mb: limit_bytes / 1024 / 1024,
        }
    } else {
        ApiError::MalformedUpload(err.body_text())
    }
}

fn io_error(context: &str, err: std::io::Error) -> ApiError {
    error!("{}: {}", context, err);
    ApiError::InternalError
}

/// A `file`/`video` part that carried a filename
struct Candidate {
    /// Index into [`FILE_FIELDS`]; lower wins
    rank: usize,
    /// Saved upload, or why its filename was refused
    media: ApiResult<UploadedMedia>,
}

async fn save_field(
    mut field: Field<'_>,
    workspace: &RequestWorkspace,
    original_filename: String,
    extension: &str,
    limit_bytes: usize,
) -> ApiResult<UploadedMedia> {
    let safe_filename = sanitize_filename(&original_filename, extension);
    let path = workspace.path().join(&safe_filename);

    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| io_error("Failed to create upload file", e))?;
    let mut size_bytes = 0u64;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limit_bytes))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| io_error("Failed to write upload file", e))?;
        size_bytes += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| io_error("Failed to flush upload file", e))?;

    info!(
        "Received {} ({} bytes) as {}",
        original_filename, size_bytes, safe_filename
    );
    Ok(UploadedMedia {
        original_filename,
        safe_filename,
        path,
        size_bytes,
    })
}

/// Read the form, saving the chosen file part into `workspace`
///
/// `file` is preferred over `video` whatever order they arrive in. Parts
/// without a filename, or with an empty one, are skipped. A refused filename
/// is only reported if its part ends up chosen, and its bytes are never
/// written.
pub async fn receive_upload(
    mut multipart: Multipart,
    workspace: &RequestWorkspace,
    limit_bytes: usize,
) -> ApiResult<(UploadedMedia, ConversionOptions)> {
    let mut candidate: Option<Candidate> = None;
    let mut saw_empty_filename = false;
    let mut options = ConversionOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_bytes))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if let Some(rank) = FILE_FIELDS.iter().position(|name| *name == field_name) {
            // plain text parts are not files
            let Some(original_filename) = field.file_name().map(|s| s.to_string()) else {
                continue;
            };
            if original_filename.is_empty() {
                saw_empty_filename = true;
                continue;
            }
            if candidate.as_ref().is_some_and(|c| c.rank <= rank) {
                continue;
            }

            if let Some(Candidate {
                media: Ok(previous),
                ..
            }) = candidate.take()
            {
                if let Err(e) = tokio::fs::remove_file(&previous.path).await {
                    warn!("Failed to remove upload {}: {}", previous.path.display(), e);
                }
            }

            let media = match validate_filename(&original_filename) {
                Ok(extension) => Ok(save_field(
                    field,
                    workspace,
                    original_filename,
                    &extension,
                    limit_bytes,
                )
                .await?),
                Err(e) => Err(e),
            };
            candidate = Some(Candidate { rank, media });
            continue;
        }

        match field_name.as_str() {
            "resolution" if options.resolution.is_none() => {
                options.resolution = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, limit_bytes))?,
                );
            }
            "max_width" if options.max_width.is_none() => {
                options.max_width = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, limit_bytes))?,
                );
            }
            _ => {}
        }
    }

    let media = match candidate {
        Some(candidate) => candidate.media?,
        None if saw_empty_filename => return Err(ApiError::EmptyFilename),
        None => return Err(ApiError::NoFileProvided),
    };
    Ok((media, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let workspace = RequestWorkspace::create(root.path()).unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::write(path.join("clip.mp4"), b"data").unwrap();

        assert!(path.starts_with(root.path()));
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("gifconv-")
        );

        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn test_workspaces_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let a = RequestWorkspace::create(root.path()).unwrap();
        let b = RequestWorkspace::create(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_workspace_requires_existing_root() {
        let root = tempfile::tempdir().unwrap();
        assert!(RequestWorkspace::create(&root.path().join("missing")).is_err());
    }
}
