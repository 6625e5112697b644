//! Custom error types for the converter service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::ConversionError;

/// Custom error type for the converter service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Neither a `file` nor a `video` field was sent
    #[error("No file was uploaded")]
    NoFileProvided,

    /// The file field carried an empty filename
    #[error("Empty filename")]
    EmptyFilename,

    /// The filename extension is not an accepted video container
    #[error("File type not allowed")]
    UnsupportedFormat,

    /// The multipart body could not be parsed
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// The probe could not determine the video duration
    #[error("Could not read the video file")]
    UnreadableMedia,

    /// The video is longer than the configured limit
    #[error("Video must be at most {limit_secs} seconds long")]
    DurationExceeded { limit_secs: f64 },

    /// The request body exceeded the configured limit
    #[error("File too large. Maximum allowed size: {limit_mb}MB")]
    PayloadTooLarge { limit_mb: usize },

    /// Either encoder pass failed
    #[error("GIF conversion failed: {0}")]
    ConversionFailed(#[from] ConversionError),

    /// The produced GIF could not be opened for streaming
    #[error("Failed to send the GIF file")]
    SendFailed,

    /// No route matched the request
    #[error("Not found")]
    NotFound,

    /// The route exists but not for this method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Internal server error
    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFileProvided
            | ApiError::EmptyFilename
            | ApiError::UnsupportedFormat
            | ApiError::MalformedUpload(_)
            | ApiError::UnreadableMedia
            | ApiError::DurationExceeded { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::ConversionFailed(_) | ApiError::SendFailed | ApiError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the caller; never includes encoder output or paths
    pub fn client_message(&self) -> String {
        match self {
            ApiError::MalformedUpload(_) => "Malformed multipart upload".to_string(),
            ApiError::ConversionFailed(_) => "GIF conversion failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.client_message(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
