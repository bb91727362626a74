//! Error types for the file-facing layers (config, presets, content, capture).

use std::fmt;

/// Errors from reading or writing JSON preference and content files.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read or write a file.
    Io(std::io::Error),
    /// File contents were not valid JSON for the expected shape.
    Parse(serde_json::Error),
    /// The platform has no user config directory.
    NoConfigDir,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Config file I/O failed: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config JSON: {}", e),
            ConfigError::NoConfigDir => write!(f, "Could not determine config directory"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::NoConfigDir => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors from snapshot and recording output.
#[derive(Debug)]
pub enum CaptureError {
    /// Failed to create or write the output file.
    Io(std::io::Error),
    /// PNG encoding failed.
    Image(image::ImageError),
    /// GIF encoding failed.
    Gif(gif::EncodingError),
    /// A recording was finished with no frames.
    Empty,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Io(e) => write!(f, "Failed to write capture: {}", e),
            CaptureError::Image(e) => write!(f, "Failed to encode PNG: {}", e),
            CaptureError::Gif(e) => write!(f, "Failed to encode GIF: {}", e),
            CaptureError::Empty => write!(f, "Recording has no frames"),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Io(e) => Some(e),
            CaptureError::Image(e) => Some(e),
            CaptureError::Gif(e) => Some(e),
            CaptureError::Empty => None,
        }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        CaptureError::Io(e)
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(e: image::ImageError) -> Self {
        CaptureError::Image(e)
    }
}

impl From<gif::EncodingError> for CaptureError {
    fn from(e: gif::EncodingError) -> Self {
        CaptureError::Gif(e)
    }
}
