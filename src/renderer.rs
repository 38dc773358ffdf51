//! Audio-reactive renderer: playback state machine and per-frame dispatch.
//!
//! The renderer owns the single live [`SignalSource`] and all animation
//! state. Controls mutate it between frames; [`Renderer::frame`] turns the
//! latest samples into draw commands for exactly one mode.

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::audio::SignalSource;
use crate::beat::{BeatDetector, BeatEvent};
use crate::canvas::Frame;
use crate::error::AcquireError;
use crate::metric::Loudness;
use crate::modes::{FrameInput, ModeStates, RenderMode};
use crate::params::{ControlConfig, SigmaActivation, Settings, VisualStyle};

/// Playback state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// No audio loaded
    Idle,
    Playing,
    Paused,
}

/// User input forwarded to the renderer
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Control {
    SelectMode(RenderMode),
    SetSpeed(f32),
    AdjustSpeed(f32),
    TogglePlayback,
    ToggleSigma,
    /// Canvas size in pixels
    Resize(Vec2),
}

pub struct Renderer<S> {
    style: VisualStyle,
    controls: ControlConfig,
    session: Option<S>,
    state: PlaybackState,
    mode: RenderMode,
    speed: f32,
    sigma_active: bool,
    size: Vec2,
    detector: BeatDetector,
    modes: ModeStates,
    spectrum: Vec<u8>,
    waveform: Vec<u8>,
    loudness: Loudness,
    last_beat: Option<BeatEvent>,
    frame: Frame,
}

impl<S: SignalSource> Renderer<S> {
    pub fn new(settings: &Settings, size: Vec2) -> Self {
        let mut detector = BeatDetector::new(settings.beat.clone());
        let speed = settings.controls.clamp_speed(settings.controls.speed);
        detector.set_speed(speed);

        Self {
            modes: ModeStates::new(&settings.style),
            style: settings.style.clone(),
            controls: settings.controls.clone(),
            session: None,
            state: PlaybackState::Idle,
            mode: RenderMode::default(),
            speed,
            sigma_active: false,
            size,
            detector,
            spectrum: Vec::new(),
            waveform: Vec::new(),
            loudness: Loudness::default(),
            last_beat: None,
            frame: Frame::default(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn sigma_active(&self) -> bool {
        self.sigma_active
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Loudness measured on the last drawn frame
    pub fn loudness(&self) -> Loudness {
        self.loudness
    }

    pub fn last_beat(&self) -> Option<BeatEvent> {
        self.last_beat
    }

    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    pub fn modes(&self) -> &ModeStates {
        &self.modes
    }

    /// Current track has played out
    pub fn session_finished(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_finished())
    }

    /// Replace the live session with the one `build` produces
    ///
    /// If `build` or the new session's `start` fails, the current session
    /// keeps playing. The current session is paused before the new one
    /// starts and released once it has, so two sessions never play at once.
    pub fn load<F>(&mut self, build: F) -> Result<(), AcquireError>
    where
        F: FnOnce() -> Result<S, AcquireError>,
    {
        let mut next = build()?;

        let was_playing = self.state == PlaybackState::Playing;
        if let Some(previous) = self.session.as_mut() {
            if was_playing {
                previous.pause()?;
            }
        }

        if let Err(e) = next.start() {
            if let Some(previous) = self.session.as_mut() {
                if was_playing {
                    if let Err(resume) = previous.start() {
                        warn!("Cannot resume '{}': {}", previous.label(), resume);
                        self.state = PlaybackState::Paused;
                    }
                }
            }
            return Err(e);
        }

        if let Some(previous) = self.session.take() {
            debug!("Releasing '{}'", previous.label());
            drop(previous);
        }
        self.detector.reset();
        self.last_beat = None;

        info!("Playing '{}'", next.label());
        self.session = Some(next);
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Release the session and return to idle
    pub fn unload(&mut self) {
        self.session = None;
        self.state = PlaybackState::Idle;
        self.loudness = Loudness::default();
    }

    pub fn apply(&mut self, control: Control) -> Result<(), AcquireError> {
        match control {
            Control::SelectMode(mode) => {
                if mode != self.mode {
                    debug!("Mode {} -> {}", self.mode, mode);
                }
                self.mode = mode;
            }
            Control::SetSpeed(speed) => self.set_speed(speed),
            Control::AdjustSpeed(delta) => self.set_speed(self.speed + delta),
            Control::TogglePlayback => self.toggle_playback()?,
            Control::ToggleSigma => {
                self.sigma_active = match self.style.sigma.activation {
                    SigmaActivation::Toggle => !self.sigma_active,
                    SigmaActivation::Latch => true,
                };
            }
            Control::Resize(size) => {
                // Minimised windows report 0x0; keep the last drawable size
                if size.x >= 1.0 && size.y >= 1.0 {
                    self.size = size;
                }
            }
        }
        Ok(())
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = self.controls.clamp_speed(speed);
        self.detector.set_speed(self.speed);
    }

    fn toggle_playback(&mut self) -> Result<(), AcquireError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        match self.state {
            PlaybackState::Playing => {
                session.pause()?;
                self.state = PlaybackState::Paused;
            }
            PlaybackState::Paused | PlaybackState::Idle => {
                session.start()?;
                self.state = PlaybackState::Playing;
            }
        }
        Ok(())
    }

    /// Build the frame for time `now_s` (seconds)
    ///
    /// `None` means leave the canvas as it is: nothing is loaded, or
    /// playback is paused and the animation is frozen.
    pub fn frame(&mut self, now_s: f64) -> Option<&Frame> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        let session = self.session.as_mut()?;

        session.read(&mut self.spectrum, &mut self.waveform);
        self.loudness = Loudness::measure(&self.spectrum, self.detector.config().bass_bins);

        let beat = self.detector.process(self.loudness.bass, now_s);
        let sigma_on = self.sigma_active || self.mode == RenderMode::Sigma;
        if let Some(event) = beat {
            self.last_beat = Some(event);
            self.modes.on_beat(sigma_on, &self.style);
        }

        let input = FrameInput {
            spectrum: &self.spectrum,
            waveform: &self.waveform,
            loudness: self.loudness,
            beat,
            elapsed_s: now_s,
            size: self.size,
            speed: self.speed,
        };

        self.frame
            .begin(self.size, self.mode.background(&self.style), self.mode);
        self.modes
            .draw(self.mode, &input, &self.style, &mut self.frame);
        if sigma_on {
            self.modes
                .sigma
                .draw_overlay(&input, &self.style.sigma, &mut self.frame);
        }
        self.frame.offset = self.modes.sigma.shake_offset(&self.style.sigma);

        Some(&self.frame)
    }

    /// Label text reflecting playback state, e.g. `Playing · song.mp3 · wave · ×1.0 · σ`
    pub fn status(&self) -> String {
        let sigma = if self.sigma_active { " · σ" } else { "" };
        let settings = format!("{} · ×{:.1}{}", self.mode, self.speed, sigma);
        match (self.state, &self.session) {
            (PlaybackState::Playing, Some(session)) => {
                format!("Playing · {} · {}", session.label(), settings)
            }
            (PlaybackState::Paused, Some(session)) => {
                format!("Paused · {} · {}", session.label(), settings)
            }
            _ => format!("Idle · {} · drop a file or press O", settings),
        }
    }
}
