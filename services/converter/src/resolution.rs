//! Target size derivation for the produced GIF

use common::process::FrameSize;
use tracing::warn;

use crate::models::ConversionOptions;

/// Parse `"<width>x<height>"` into a size with both sides positive
pub fn parse_resolution(resolution: &str) -> Option<FrameSize> {
    let (width, height) = resolution.split_once('x')?;
    let width: u32 = width.trim().parse().ok()?;
    let height: u32 = height.trim().parse().ok()?;

    (width > 0 && height > 0).then(|| FrameSize::new(width, height))
}

/// Cap the width at `max_width`, scaling the height to keep the aspect ratio
pub fn fit_width(max_width: u32, native: FrameSize) -> FrameSize {
    if native.width <= max_width {
        return native;
    }

    let scale = f64::from(max_width) / f64::from(native.width);
    let height = (f64::from(native.height) * scale).round().max(1.0) as u32;
    FrameSize::new(max_width, height)
}

#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver {
    default_size: FrameSize,
}

impl ParameterResolver {
    pub fn new(default_size: FrameSize) -> Self {
        Self { default_size }
    }

    /// An explicit resolution wins and is used verbatim; an unparseable one
    /// silently falls back to the default. Without a resolution, a valid
    /// `max_width` scales the native size, otherwise the default applies.
    pub fn resolve(&self, options: &ConversionOptions, native: Option<FrameSize>) -> FrameSize {
        if let Some(resolution) = options.resolution.as_deref() {
            return parse_resolution(resolution).unwrap_or_else(|| {
                warn!(
                    "Unparseable resolution {:?}, using {}",
                    resolution, self.default_size
                );
                self.default_size
            });
        }

        let max_width = options
            .max_width
            .as_deref()
            .and_then(|w| w.trim().parse::<u32>().ok())
            .filter(|w| *w > 0);

        match (max_width, native) {
            (Some(max_width), Some(native)) => fit_width(max_width, native),
            _ => self.default_size,
        }
    }
}
