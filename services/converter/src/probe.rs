use std::path::Path;

use common::process::{FfprobeCommand, FrameSize, ProcessRunner};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::models::MediaMetadata;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    duration: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

pub struct MediaProbe<'a> {
    runner: &'a dyn ProcessRunner,
    ffprobe_path: &'a str,
}

impl<'a> MediaProbe<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, ffprobe_path: &'a str) -> Self {
        Self {
            runner,
            ffprobe_path,
        }
    }

    /// Duration and size of the first video stream, or `None` when the file
    /// cannot be inspected
    pub async fn probe(&self, file_path: &Path) -> Option<MediaMetadata> {
        info!("Extracting metadata from file: {}", file_path.display());

        let spec = FfprobeCommand::streams(self.ffprobe_path, file_path);
        let output = match self.runner.run(&spec).await {
            Ok(output) => output,
            Err(e) => {
                error!("ffprobe could not run: {}", e);
                return None;
            }
        };

        if !output.success {
            error!(
                "ffprobe failed with status {:?}: {}",
                output.code,
                output.stderr_lossy()
            );
            return None;
        }

        let metadata = Self::parse_ffprobe_output(&output.stdout);
        if metadata.is_none() {
            warn!("No video stream duration found in {}", file_path.display());
        }
        metadata
    }

    fn parse_ffprobe_output(stdout: &[u8]) -> Option<MediaMetadata> {
        let ffprobe_data: ProbeOutput = match serde_json::from_slice(stdout) {
            Ok(data) => data,
            Err(e) => {
                error!("Unparseable ffprobe output: {}", e);
                return None;
            }
        };

        let video = ffprobe_data
            .streams
            .into_iter()
            .find(|stream| stream.codec_type.as_deref() == Some("video"))?;

        let duration = video
            .duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite())?;

        let size = match (video.width, video.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(FrameSize::new(width, height))
            }
            _ => None,
        };

        Some(MediaMetadata { duration, size })
    }
}
