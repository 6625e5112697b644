//! Service configuration
//!
//! Configuration is assembled once at start-up from in-code defaults
//! overridden by `GIFCONV_*` environment variables, then shared read-only.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Prefix of every environment variable read by [`ConverterConfig::from_env`]
pub const ENV_PREFIX: &str = "GIFCONV";

/// Immutable configuration for the converter service
#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    /// Interface to bind the HTTP listener on
    pub host: String,
    /// Port to bind the HTTP listener on
    pub port: u16,
    /// Directory under which per-request work directories are created
    pub work_dir: PathBuf,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Longest accepted source video, in seconds
    pub max_duration_secs: f64,
    /// Target width used when the caller gives no usable resolution
    pub default_width: u32,
    /// Target height used when the caller gives no usable resolution
    pub default_height: u32,
    /// Frame rate of the produced GIF
    pub frame_rate: u32,
    /// Encoder executable
    pub ffmpeg_path: String,
    /// Inspection executable
    pub ffprobe_path: String,
    /// Upper bound for a single encoder invocation; unset means no limit
    #[serde(default)]
    pub encoder_timeout_secs: Option<u64>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            work_dir: std::env::temp_dir(),
            max_upload_bytes: 300 * 1024 * 1024,
            max_duration_secs: 180.0,
            default_width: 480,
            default_height: 270,
            frame_rate: 15,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            encoder_timeout_secs: None,
        }
    }
}

impl ConverterConfig {
    /// Create a new ConverterConfig from environment variables
    ///
    /// # Environment Variables
    /// - `GIFCONV_HOST`: listen interface (default: "0.0.0.0")
    /// - `GIFCONV_PORT`: listen port (default: 3002)
    /// - `GIFCONV_WORK_DIR`: temp directory root (default: OS temp dir)
    /// - `GIFCONV_MAX_UPLOAD_BYTES`: body size limit (default: 300 MiB)
    /// - `GIFCONV_MAX_DURATION_SECS`: duration limit (default: 180)
    /// - `GIFCONV_DEFAULT_WIDTH` / `GIFCONV_DEFAULT_HEIGHT`: fallback size (default: 480x270)
    /// - `GIFCONV_FRAME_RATE`: output frame rate (default: 15)
    /// - `GIFCONV_FFMPEG_PATH` / `GIFCONV_FFPROBE_PATH`: tool locations
    /// - `GIFCONV_ENCODER_TIMEOUT_SECS`: per-invocation timeout (default: none)
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("work_dir", defaults.work_dir.to_string_lossy().into_owned())?
            .set_default("max_upload_bytes", defaults.max_upload_bytes as i64)?
            .set_default("max_duration_secs", defaults.max_duration_secs)?
            .set_default("default_width", i64::from(defaults.default_width))?
            .set_default("default_height", i64::from(defaults.default_height))?
            .set_default("frame_rate", i64::from(defaults.frame_rate))?
            .set_default("ffmpeg_path", defaults.ffmpeg_path)?
            .set_default("ffprobe_path", defaults.ffprobe_path)?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.frame_rate == 0 {
            return Err(ConfigError::Invalid("frame_rate must be positive".to_string()));
        }
        if self.default_width == 0 || self.default_height == 0 {
            return Err(ConfigError::Invalid(
                "default_width and default_height must be positive".to_string(),
            ));
        }
        if self.max_duration_secs.is_nan() || self.max_duration_secs <= 0.0 {
            return Err(ConfigError::Invalid(
                "max_duration_secs must be positive".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address the HTTP listener binds to
    pub fn bind_address(&self) -> ConfigResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("Invalid bind address: {}", e)))
    }

    /// Timeout applied to each encoder invocation, if any
    pub fn encoder_timeout(&self) -> Option<Duration> {
        self.encoder_timeout_secs.map(Duration::from_secs)
    }
}
