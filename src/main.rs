//! Beatcanvas - audio-reactive 2D visualizer
//!
//! Plays a track and paints one of several stock visualisations from its
//! spectrum and waveform on every display refresh.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use glam::Vec2;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use beatcanvas::audio::{
    create_capture, default_output_rate, is_audio_path, AudioSession, AudioSource, Playlist,
    SharedCapture, AUDIO_EXTENSIONS,
};
use beatcanvas::cli::Args;
use beatcanvas::error::RenderError;
use beatcanvas::modes::RenderMode;
use beatcanvas::params::{RecordingConfig, Settings};
use beatcanvas::renderer::{Control, Renderer};
use beatcanvas::rendering::RenderSystem;

/// Fixed-timestep capture state (recording mode only)
struct Recording {
    config: RecordingConfig,
    capture: SharedCapture,
    frame: usize,
}

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Visualisation and audio
    renderer: Renderer<AudioSession>,
    settings: Settings,
    playlist: Playlist,
    pending: Option<AudioSource>,
    last_error: Option<String>,
    recording: Option<Recording>,

    // Window title currently shown
    title: String,

    // Time tracking
    start_time: Instant,

    // Fatal error that ended the event loop
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(args: &Args, settings: Settings, recording: Option<RecordingConfig>) -> anyhow::Result<Self> {
        let size = Vec2::new(
            settings.render.window_width as f32,
            settings.render.window_height as f32,
        );
        let mut renderer = Renderer::new(&settings, size);
        renderer.apply(Control::SelectMode(args.mode))?;
        if args.sigma {
            renderer.apply(Control::ToggleSigma)?;
        }

        let recording = match recording {
            Some(config) => {
                let rate = default_output_rate()?;
                let capture = create_capture(&config.audio_path(), rate)
                    .with_context(|| format!("creating {}", config.audio_path()))?;
                Some(Recording {
                    config,
                    capture,
                    frame: 0,
                })
            }
            None => None,
        };

        let playlist = args.playlist();
        let pending = args.initial_source(&playlist);

        Ok(Self {
            window: None,
            render_system: None,
            renderer,
            settings,
            playlist,
            pending,
            last_error: None,
            recording,
            title: String::new(),
            start_time: Instant::now(),
            fatal: None,
        })
    }

    /// Swap to `source`; on failure the current track keeps playing
    fn play(&mut self, source: AudioSource) -> bool {
        let analyser = self.settings.analyser.clone();
        let capture = self.recording.as_ref().map(|r| Arc::clone(&r.capture));

        match self
            .renderer
            .load(|| AudioSession::open(&source, &analyser, capture))
        {
            Ok(()) => {
                self.last_error = None;
                true
            }
            Err(e) => {
                warn!("Cannot play {}: {}", source, e);
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Move through the playlist until a track plays
    fn step_playlist(&mut self, forward: bool) {
        for _ in 0..self.playlist.len() {
            let next = if forward {
                self.playlist.advance()
            } else {
                self.playlist.back()
            };
            let Some(source) = next else {
                return;
            };
            if self.play(source) {
                return;
            }
        }
    }

    fn on_track_end(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        self.step_playlist(true);
        // Every track failed: stop retrying a finished session each frame
        if self.renderer.session_finished() {
            self.renderer.unload();
        }
    }

    fn open_file_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Open audio file")
            .add_filter("Audio", AUDIO_EXTENSIONS)
            .pick_file();
        if let Some(path) = picked {
            self.play(AudioSource::Decoded(path));
        }
    }

    fn on_dropped_file(&mut self, path: PathBuf) {
        if is_audio_path(&path) {
            self.play(AudioSource::Decoded(path));
        } else {
            warn!("Ignoring dropped file {}", path.display());
            self.last_error = Some(format!("{} is not an audio file", path.display()));
        }
    }

    fn control(&mut self, control: Control) {
        if let Err(e) = self.renderer.apply(control) {
            warn!("{:?} failed: {}", control, e);
            self.last_error = Some(e.to_string());
        }
    }

    fn on_key(&mut self, key: KeyCode, repeat: bool, event_loop: &ActiveEventLoop) {
        let step = self.settings.controls.speed_step;
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::ArrowUp => self.control(Control::AdjustSpeed(step)),
            KeyCode::ArrowDown => self.control(Control::AdjustSpeed(-step)),
            _ if repeat => {}
            KeyCode::Digit1 => self.control(Control::SelectMode(RenderMode::Wave)),
            KeyCode::Digit2 => self.control(Control::SelectMode(RenderMode::Circle)),
            KeyCode::Digit3 => self.control(Control::SelectMode(RenderMode::Heartbeat)),
            KeyCode::Digit4 => self.control(Control::SelectMode(RenderMode::Galaxy)),
            KeyCode::Digit5 => self.control(Control::SelectMode(RenderMode::Sigma)),
            KeyCode::Space => self.control(Control::TogglePlayback),
            KeyCode::KeyS => self.control(Control::ToggleSigma),
            KeyCode::KeyN => self.step_playlist(true),
            KeyCode::KeyP => self.step_playlist(false),
            KeyCode::KeyO => self.open_file_dialog(),
            _ => {}
        }
    }

    fn refresh_title(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let mut title = format!("beatcanvas · {}", self.renderer.status());
        if let Some(e) = &self.last_error {
            title.push_str(" · ");
            title.push_str(e);
        }
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("beatcanvas")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.settings.render.window_width,
                self.settings.render.window_height,
            ))
            .with_resizable(self.recording.is_none());

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fatal = Some(anyhow::Error::new(e).context("creating window"));
                event_loop.exit();
                return;
            }
        };

        let render_system =
            match pollster::block_on(RenderSystem::new(Arc::clone(&window), &self.settings.render))
            {
                Ok(system) => system,
                Err(e) => {
                    self.fatal = Some(anyhow::Error::new(e).context("initializing renderer"));
                    event_loop.exit();
                    return;
                }
            };

        let (width, height) = render_system.size();
        self.control(Control::Resize(Vec2::new(width as f32, height as f32)));

        info!("beatcanvas is running");
        info!("Keys: 1-5 mode, Up/Down speed, Space play/pause, S sigma, O open, N/P track, Esc quit");

        self.window = Some(window);
        self.render_system = Some(render_system);

        if let Some(source) = self.pending.take() {
            self.play(source);
        }
        self.refresh_title();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        repeat,
                        ..
                    },
                ..
            } => {
                self.on_key(key, repeat, event_loop);
                self.refresh_title();
            }
            WindowEvent::DroppedFile(path) => {
                self.on_dropped_file(path);
                self.refresh_title();
            }
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
                self.control(Control::Resize(Vec2::new(
                    size.width as f32,
                    size.height as f32,
                )));
            }
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.session_finished() {
            self.on_track_end();
            self.refresh_title();
        }

        let time_s = match &self.recording {
            Some(recording) => recording.config.frame_time(recording.frame),
            None => self.start_time.elapsed().as_secs_f64(),
        };

        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        if let Some(frame) = self.renderer.frame(time_s) {
            render_system.paint(frame);
        }

        match render_system.present() {
            Ok(()) => {}
            Err(RenderError::Frame(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                render_system.reconfigure();
            }
            Err(RenderError::Frame(wgpu::SurfaceError::OutOfMemory)) => {
                self.fatal = Some(anyhow::anyhow!("GPU out of memory"));
                event_loop.exit();
                return;
            }
            Err(e) => warn!("Render error: {}", e),
        }

        if let Some(recording) = self.recording.as_mut() {
            let path = PathBuf::from(format!(
                "{}/frame_{:05}.png",
                recording.config.frames_dir(),
                recording.frame
            ));
            if let Err(e) = render_system.capture_frame(&path) {
                error!("{}", e);
            }

            recording.frame += 1;
            if recording.frame >= recording.config.total_frames() {
                info!("Recorded {} frames", recording.frame);
                event_loop.exit();
            }
        }
    }

    /// Stop audio and finish the WAV capture
    fn shutdown(&mut self) -> anyhow::Result<()> {
        self.renderer.unload();
        if let Some(recording) = self.recording.take() {
            let mut writer = recording
                .capture
                .lock()
                .map_err(|_| anyhow::anyhow!("audio capture lock poisoned"))?;
            writer.flush().context("finalizing recorded audio")?;
            info!("Audio saved to {}", recording.config.audio_path());
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("beatcanvas=info")),
        )
        .init();

    let args = Args::parse();
    let settings = args.load_settings().context("loading configuration")?;
    let recording = args
        .create_recording_config()
        .context("creating recording directories")?;

    let mut app = App::new(&args, settings, recording)?;
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;

    app.shutdown()?;
    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
