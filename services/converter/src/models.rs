//! Request-scoped values flowing through the conversion workflow

use std::path::PathBuf;

use common::process::FrameSize;

/// Metadata of the first video stream of an upload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaMetadata {
    /// Duration in seconds
    pub duration: f64,
    /// Native frame size, when the stream reports it
    pub size: Option<FrameSize>,
}

/// An upload saved into its request work directory
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    /// Filename as sent by the client
    pub original_filename: String,
    /// Sanitized filename used on disk
    pub safe_filename: String,
    /// Where the bytes were written
    pub path: PathBuf,
    /// Bytes written
    pub size_bytes: u64,
}

impl UploadedMedia {
    /// Sanitized filename without its extension
    pub fn stem(&self) -> &str {
        self.safe_filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(&self.safe_filename)
    }
}

/// Inputs of one two-pass encode
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub size: FrameSize,
    pub frame_rate: u32,
}

/// A finished GIF ready to be sent back
#[derive(Debug, Clone)]
pub struct ConvertedGif {
    pub path: PathBuf,
    pub download_name: String,
}

/// Optional form fields accompanying the file
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// `"<width>x<height>"`
    pub resolution: Option<String>,
    /// Aspect-preserving width cap, used only without `resolution`
    pub max_width: Option<String>,
}
