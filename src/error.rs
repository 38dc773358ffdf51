//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a user-selected source into a playing audio session.
///
/// None of these are fatal: the renderer reports them and keeps running.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// File missing or unreadable
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container or codec not recognised, or no audio track
    #[error("unsupported audio in {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    /// Decoder rejected the stream
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Output device missing or refused to start (the native analogue of blocked autoplay)
    #[error("audio playback unavailable: {0}")]
    Playback(String),
}

/// Invalid or unreadable configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid parameter: {0}")]
    Invalid(String),
}

/// GPU setup or frame presentation failure.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Frame(#[from] wgpu::SurfaceError),

    #[error("failed to save frame {path}: {source}")]
    Capture {
        path: String,
        #[source]
        source: image::ImageError,
    },
}
