//! Upload validation: filename rules and duration limit

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{ApiError, ApiResult};
use crate::models::MediaMetadata;

/// Video containers accepted for conversion
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv"];

/// Lower-cased text after the last dot, if the name has one
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
}

/// Whether the filename carries one of [`ALLOWED_EXTENSIONS`]
pub fn allowed_file(filename: &str) -> bool {
    file_extension(filename)
        .map(|extension| ALLOWED_EXTENSIONS.contains(&extension.as_str()))
        .unwrap_or(false)
}

/// Validate the client-supplied filename, returning its extension
pub fn validate_filename(filename: &str) -> ApiResult<String> {
    if filename.is_empty() {
        return Err(ApiError::EmptyFilename);
    }

    if !allowed_file(filename) {
        return Err(ApiError::UnsupportedFormat);
    }

    Ok(file_extension(filename).unwrap_or_default())
}

/// Validate the probe result against the duration limit
pub fn validate_duration(
    metadata: Option<MediaMetadata>,
    max_duration_secs: f64,
) -> ApiResult<MediaMetadata> {
    let metadata = metadata.ok_or(ApiError::UnreadableMedia)?;

    if metadata.duration > max_duration_secs {
        return Err(ApiError::DurationExceeded {
            limit_secs: max_duration_secs,
        });
    }

    Ok(metadata)
}

/// Reduce a client filename to a safe, flat, ASCII name
///
/// Path separators become word breaks, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped, and leading or trailing dots and
/// underscores are trimmed, so `../../etc/passwd` becomes `etc_passwd`.
/// A name that sanitizes to nothing is replaced by `video.<extension>`.
pub fn sanitize_filename(filename: &str, extension: &str) -> String {
    static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();
    let regex = UNSAFE_CHARS
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("Failed to compile filename regex"));

    let flattened: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = regex.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c == '_');

    if trimmed.is_empty() {
        format!("video.{}", extension)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::process::FrameSize;

    fn metadata(duration: f64) -> MediaMetadata {
        MediaMetadata {
            duration,
            size: Some(FrameSize::new(1920, 1080)),
        }
    }

    #[test]
    fn test_allowed_extensions_case_insensitive() {
        for name in ["a.mp4", "b.AVI", "c.Mov", "d.mkv", "e.WMV", "f.tar.mp4"] {
            assert!(allowed_file(name), "{} should be allowed", name);
        }
    }

    #[test]
    fn test_rejected_extensions() {
        for name in ["notes.txt", "clip.mp4.txt", "mp4", "video.", "archive.gif"] {
            assert!(!allowed_file(name), "{} should be rejected", name);
            assert!(matches!(
                validate_filename(name),
                Err(ApiError::UnsupportedFormat)
            ));
        }
    }

    #[test]
    fn test_empty_filename() {
        assert!(matches!(validate_filename(""), Err(ApiError::EmptyFilename)));
    }

    #[test]
    fn test_validate_filename_returns_lowercase_extension() {
        assert_eq!(validate_filename("Holiday.MKV").unwrap(), "mkv");
    }

    #[test]
    fn test_duration_limit_is_inclusive() {
        assert!(validate_duration(Some(metadata(180.0)), 180.0).is_ok());
        assert!(matches!(
            validate_duration(Some(metadata(180.01)), 180.0),
            Err(ApiError::DurationExceeded { .. })
        ));
        assert!(matches!(
            validate_duration(Some(metadata(200.0)), 180.0),
            Err(ApiError::DurationExceeded { .. })
        ));
    }

    #[test]
    fn test_missing_metadata_is_unreadable() {
        assert!(matches!(
            validate_duration(None, 180.0),
            Err(ApiError::UnreadableMedia)
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Holiday.mp4", "mp4"), "My_Holiday.mp4");
        assert_eq!(sanitize_filename("../../etc/passwd.mp4", "mp4"), "etc_passwd.mp4");
        assert_eq!(sanitize_filename("C:\\videos\\clip.avi", "avi"), "C_videos_clip.avi");
        assert_eq!(sanitize_filename("rm -rf $(x);.mov", "mov"), "rm_-rf_x.mov");
        assert_eq!(sanitize_filename("ação.mkv", "mkv"), "ao.mkv");
    }

    #[test]
    fn test_sanitize_filename_fallback() {
        assert_eq!(sanitize_filename("....", "mp4"), "video.mp4");
        assert_eq!(sanitize_filename("日本", "wmv"), "video.wmv");
    }
}
