//! End-to-end render loop behaviour with a scripted signal.

use std::collections::VecDeque;

use beatcanvas::audio::SignalSource;
use beatcanvas::canvas::{Background, DrawCommand};
use beatcanvas::error::AcquireError;
use beatcanvas::metric::Loudness;
use beatcanvas::modes::RenderMode;
use beatcanvas::params::Settings;
use beatcanvas::renderer::{Control, PlaybackState, Renderer};
use glam::Vec2;

const FPS: f64 = 60.0;

/// Replays queued buffers, repeating the last one
struct ScriptedSignal {
    frames: VecDeque<(Vec<u8>, Vec<u8>)>,
    last: (Vec<u8>, Vec<u8>),
}

impl ScriptedSignal {
    fn constant(spectrum: Vec<u8>, waveform: Vec<u8>) -> Self {
        Self {
            frames: VecDeque::new(),
            last: (spectrum, waveform),
        }
    }

    fn bass(level: u8) -> Self {
        let mut spectrum = vec![0u8; 256];
        spectrum[..30].fill(level);
        Self::constant(spectrum, vec![128u8; 512])
    }

    fn then(mut self, spectrum: Vec<u8>, waveform: Vec<u8>) -> Self {
        self.frames.push_back((spectrum, waveform));
        self
    }
}

impl SignalSource for ScriptedSignal {
    fn start(&mut self) -> Result<(), AcquireError> {
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AcquireError> {
        Ok(())
    }

    fn read(&mut self, spectrum: &mut Vec<u8>, waveform: &mut Vec<u8>) {
        if let Some(next) = self.frames.pop_front() {
            self.last = next;
        }
        spectrum.clone_from(&self.last.0);
        waveform.clone_from(&self.last.1);
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn label(&self) -> &str {
        "scripted"
    }
}

fn playing(signal: ScriptedSignal) -> Renderer<ScriptedSignal> {
    let mut renderer = Renderer::new(&Settings::default(), Vec2::new(640.0, 400.0));
    renderer.load(|| Ok(signal)).unwrap();
    renderer
}

/// Times of every beat over `frames` frames
fn beat_times(renderer: &mut Renderer<ScriptedSignal>, frames: usize) -> Vec<f64> {
    let mut times = Vec::new();
    for n in 0..frames {
        renderer.frame(n as f64 / FPS);
        if let Some(beat) = renderer.last_beat() {
            if times.last() != Some(&beat.at_s) {
                times.push(beat.at_s);
            }
        }
    }
    times
}

#[test]
fn no_audio_galaxy_draws_nothing() {
    let mut renderer: Renderer<ScriptedSignal> =
        Renderer::new(&Settings::default(), Vec2::new(640.0, 400.0));
    renderer.apply(Control::SelectMode(RenderMode::Galaxy)).unwrap();

    for n in 0..120 {
        assert!(renderer.frame(n as f64 / FPS).is_none());
    }
    assert_eq!(renderer.state(), PlaybackState::Idle);
    assert_eq!(renderer.loudness(), Loudness::default());
}

#[test]
fn sustained_loud_input_respects_cooldown() {
    let mut renderer = playing(ScriptedSignal::bass(250));
    let times = beat_times(&mut renderer, 600);

    assert!(!times.is_empty());
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= 0.2 - 1e-9, "beats too close: {:?}", pair);
    }
}

/// Loud bass every fifth frame (every 83 ms at 60 fps), quiet otherwise
fn pulsing(frames: usize) -> ScriptedSignal {
    let mut loud = vec![0u8; 256];
    loud[..30].fill(250);
    let quiet = vec![0u8; 256];

    let mut signal = ScriptedSignal::constant(quiet.clone(), vec![128u8; 512]);
    for n in 0..frames {
        let spectrum = if n % 5 == 0 { loud.clone() } else { quiet.clone() };
        signal = signal.then(spectrum, vec![128u8; 512]);
    }
    signal
}

#[test]
fn faster_speed_shortens_cooldown() {
    let mut slow = playing(pulsing(300));
    let mut fast = playing(pulsing(300));
    fast.apply(Control::SetSpeed(3.0)).unwrap();

    // 200 ms cooldown catches every third pulse; at ×3 it is 67 ms
    let slow_count = beat_times(&mut slow, 300).len();
    let fast_count = beat_times(&mut fast, 300).len();
    assert_eq!(fast_count, 60);
    assert_eq!(slow_count, 20);
}

#[test]
fn quiet_input_never_beats() {
    let mut renderer = playing(ScriptedSignal::bass(150));
    assert!(beat_times(&mut renderer, 300).is_empty());
}

#[test]
fn single_beat_then_cooldown() {
    let mut renderer = playing(ScriptedSignal::bass(200));

    renderer.frame(5.0);
    let first = renderer.last_beat().expect("bass 200 above floor 180");

    renderer.frame(5.0 + 1.0 / FPS);
    assert_eq!(renderer.last_beat(), Some(first));
}

#[test]
fn loudness_stays_in_byte_range() {
    for level in [0u8, 255] {
        let signal = ScriptedSignal::constant(vec![level; 256], vec![level; 512]);
        let mut renderer = playing(signal);
        renderer.frame(0.0);

        let loudness = renderer.loudness();
        assert_eq!(loudness.average, level as f32);
        assert_eq!(loudness.bass, level as f32);
    }
}

#[test]
fn silence_draws_flat_midline() {
    let mut renderer = playing(ScriptedSignal::bass(0));
    let frame = renderer.frame(0.0).unwrap();

    let [DrawCommand::Polyline { points, .. }] = &frame.commands[..] else {
        panic!("expected one polyline, got {:?}", frame.commands);
    };
    assert_eq!(points.len(), 512);
    assert_eq!(points[0].x, 0.0);
    assert_eq!(points[511].x, 640.0);
    assert!(points.iter().all(|p| p.y == 200.0));
}

#[test]
fn heartbeat_trail_bounded_by_width() {
    let mut renderer = playing(ScriptedSignal::bass(220));
    renderer.apply(Control::SelectMode(RenderMode::Heartbeat)).unwrap();

    for n in 0..2000 {
        renderer.frame(n as f64 / FPS);
        assert!(renderer.modes().heartbeat.trail.len() <= 640);
    }
    assert_eq!(renderer.modes().heartbeat.trail.len(), 640);

    renderer.apply(Control::Resize(Vec2::new(200.0, 100.0))).unwrap();
    renderer.frame(2000.0 / FPS);
    assert_eq!(renderer.modes().heartbeat.trail.len(), 200);
}

#[test]
fn mode_switch_mid_animation() {
    let mut renderer = playing(ScriptedSignal::bass(100));
    let mut t = 0.0;
    for mode in [
        RenderMode::Galaxy,
        RenderMode::Heartbeat,
        RenderMode::Circle,
        RenderMode::Sigma,
        RenderMode::Wave,
        RenderMode::Galaxy,
    ] {
        for _ in 0..3 {
            renderer.frame(t);
            t += 1.0 / FPS;
        }
        renderer.apply(Control::SelectMode(mode)).unwrap();
        let frame = renderer.frame(t).unwrap();
        t += 1.0 / FPS;
        assert_eq!(frame.mode, Some(mode));
    }
}

#[test]
fn galaxy_fades_and_draws_particles() {
    let mut renderer = playing(ScriptedSignal::bass(0));
    renderer.apply(Control::SelectMode(RenderMode::Galaxy)).unwrap();

    let frame = renderer.frame(0.0).unwrap();
    assert!(matches!(frame.background, Background::Fade(_)));
    let circles = frame
        .commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::Circle { .. }))
        .count();
    assert_eq!(circles, 160);
}

#[test]
fn malformed_buffers_are_tolerated() {
    let signal = ScriptedSignal::bass(0)
        .then(Vec::new(), Vec::new())
        .then(vec![255], vec![0]);
    let mut renderer = playing(signal);

    for mode in RenderMode::ALL {
        renderer.apply(Control::SelectMode(mode)).unwrap();
        let frame = renderer.frame(0.0).unwrap();
        assert_eq!(frame.mode, Some(mode));
    }
}

#[test]
fn pause_keeps_canvas_and_state() {
    let mut renderer = playing(ScriptedSignal::bass(220));
    renderer.apply(Control::SelectMode(RenderMode::Galaxy)).unwrap();
    renderer.frame(0.0);
    let stars_before: Vec<Vec2> = renderer
        .modes()
        .galaxy
        .stars
        .iter()
        .map(|s| s.position)
        .collect();

    renderer.apply(Control::TogglePlayback).unwrap();
    for n in 1..30 {
        assert!(renderer.frame(n as f64 / FPS).is_none());
    }
    let stars_after: Vec<Vec2> = renderer
        .modes()
        .galaxy
        .stars
        .iter()
        .map(|s| s.position)
        .collect();
    assert_eq!(stars_before, stars_after);
}

#[test]
fn failed_load_reports_and_keeps_playing() {
    let mut renderer = playing(ScriptedSignal::bass(0));

    let result = renderer.load(|| Err(AcquireError::Playback("no device".to_string())));
    assert!(result.is_err());
    assert_eq!(renderer.state(), PlaybackState::Playing);
    assert!(renderer.frame(0.0).is_some());
}
