//! Parameter definitions with units and documented semantics.
//!
//! Every tunable lives here with its default. A TOML file may override
//! any subset; missing keys keep their defaults.

mod audio;
mod render;
mod visual;

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

// Re-export all types
pub use audio::{audio_constants, AnalyserConfig, BeatConfig};
pub use render::{ControlConfig, RecordingConfig, RenderConfig};
pub use visual::{
    CircleStyle, GalaxyStyle, HeartbeatStyle, SigmaActivation, SigmaStyle, VisualStyle, WaveStyle,
};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analyser: AnalyserConfig,
    pub beat: BeatConfig,
    pub controls: ControlConfig,
    pub render: RenderConfig,
    pub style: VisualStyle,
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml(&text, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analyser.validate()?;
        self.beat.validate()?;
        let controls = &self.controls;
        // Positive comparisons so NaN fails them
        if !(controls.min_speed > 0.0 && controls.min_speed <= controls.max_speed) {
            return Err(ConfigError::Invalid(format!(
                "speed range {}..{} is empty or non-positive",
                controls.min_speed, controls.max_speed
            )));
        }
        if !controls.speed.is_finite() || !controls.speed_step.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "speed ({}) and speed_step ({}) must be finite",
                controls.speed, controls.speed_step
            )));
        }
        if self.style.wave.stride == 0 || self.style.circle.spoke_step == 0 {
            return Err(ConfigError::Invalid(
                "wave.stride and circle.spoke_step must be > 0".to_string(),
            ));
        }
        if !(self.style.heartbeat.column_width > 0.0) {
            return Err(ConfigError::Invalid(
                "heartbeat.column_width must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            [beat]
            threshold_floor = 150.0

            [style.sigma]
            activation = "latch"

            [style.galaxy]
            star_count = 10
            star_speed = [1.0, 2.0]
        "#;
        let settings = Settings::from_toml(text, Path::new("inline.toml")).unwrap();

        assert_eq!(settings.beat.threshold_floor, 150.0);
        assert_eq!(settings.beat.cooldown_ms, 200.0);
        assert_eq!(settings.style.sigma.activation, SigmaActivation::Latch);
        assert_eq!(settings.style.galaxy.star_count, 10);
        assert_eq!(settings.style.galaxy.star_speed, (1.0, 2.0));
        assert_eq!(settings.analyser.fft_size, 512);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let text = "[analyser]\nfft_size = 300\n";
        let err = Settings::from_toml(text, Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let text = "[controls]\nmin_speed = 2.0\nmax_speed = 1.0\n";
        assert!(Settings::from_toml(text, Path::new("bad.toml")).is_err());
    }

    #[test]
    fn test_nan_values_rejected() {
        for text in [
            "[controls]\nmin_speed = nan\n",
            "[controls]\nmax_speed = nan\n",
            "[controls]\nspeed = nan\n",
            "[controls]\nspeed_step = nan\n",
            "[beat]\ncooldown_ms = nan\n",
            "[beat]\nthreshold_floor = nan\n",
            "[analyser]\nmin_decibels = nan\n",
            "[analyser]\nsmoothing_time_constant = nan\n",
            "[style.heartbeat]\ncolumn_width = nan\n",
        ] {
            let result = Settings::from_toml(text, Path::new("nan.toml"));
            assert!(
                matches!(result, Err(ConfigError::Invalid(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_malformed_toml_reports_path() {
        let err = Settings::from_toml("[beat\n", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[controls]\nspeed = 2.0").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.controls.speed, 2.0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/beatcanvas.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
