//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::audio::{AudioSource, Playlist};
use crate::error::ConfigError;
use crate::modes::RenderMode;
use crate::params::{RecordingConfig, Settings};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "beatcanvas")]
#[command(about = "Audio-reactive 2D visualizer", long_about = None)]
pub struct Args {
    /// Audio file to play on startup (decoded fully before playback)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Preset track, streamed while playing (repeat for a playlist)
    #[arg(long = "track", value_name = "PATH")]
    pub tracks: Vec<PathBuf>,

    /// Initial mode: wave, circle, heartbeat, galaxy, sigma
    #[arg(long, value_name = "MODE", default_value = "wave")]
    pub mode: RenderMode,

    /// Initial speed multiplier (clamped to the configured range)
    #[arg(long, value_name = "FACTOR")]
    pub speed: Option<f32>,

    /// Start with the sigma overlay active
    #[arg(long)]
    pub sigma: bool,

    /// TOML file overriding parameter defaults
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Seed for galaxy particles and sigma shake
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Record frames and audio for this many seconds, then exit
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,
}

impl Args {
    /// Config file (or defaults) with command-line overrides applied
    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(width) = self.width {
            settings.render.window_width = width;
        }
        if let Some(height) = self.height {
            settings.render.window_height = height;
        }
        if let Some(speed) = self.speed {
            settings.controls.speed = speed;
        }
        if let Some(seed) = self.seed {
            settings.style.galaxy.seed = seed;
            settings.style.sigma.seed = seed.wrapping_add(1);
        }

        if settings.render.window_width == 0 || settings.render.window_height == 0 {
            return Err(ConfigError::Invalid(
                "window size must be non-zero".to_string(),
            ));
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Source to start with: the positional file, else the first preset track
    pub fn initial_source(&self, playlist: &Playlist) -> Option<AudioSource> {
        self.file
            .clone()
            .map(AudioSource::Decoded)
            .or_else(|| playlist.current())
    }

    pub fn playlist(&self) -> Playlist {
        Playlist::new(self.tracks.clone())
    }

    /// Create recording configuration (and its directories) if recording mode is enabled
    pub fn create_recording_config(&self) -> std::io::Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        let config = RecordingConfig::new(duration);

        std::fs::create_dir_all(config.frames_dir())?;
        std::fs::create_dir_all(&config.output_dir)?;
        info!(
            "Recording {}s ({} frames) to {}",
            duration,
            config.total_frames(),
            config.output_dir
        );

        Ok(Some(config))
    }
}
