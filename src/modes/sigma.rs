//! Sigma: beat-gated screen shake, flash and wobbling ring.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FrameInput;
use crate::canvas::{Color, Frame};
use crate::params::SigmaStyle;

fn orange(alpha: f32) -> Color {
    Color::rgba8(255, 100, 0, alpha)
}

#[derive(Debug)]
pub struct SigmaState {
    /// Current shake magnitude (pixels)
    pub shake: f32,
    /// Current flash alpha
    pub flash: f32,
    rng: StdRng,
}

impl SigmaState {
    pub fn new(style: &SigmaStyle) -> Self {
        Self {
            shake: 0.0,
            flash: 0.0,
            rng: StdRng::seed_from_u64(style.seed),
        }
    }

    pub fn on_beat(&mut self, style: &SigmaStyle) {
        self.shake = style.shake_magnitude;
        self.flash = style.flash_alpha;
    }

    /// Canvas translation for this frame; decays the shake
    pub fn shake_offset(&mut self, style: &SigmaStyle) -> Vec2 {
        if self.shake <= style.shake_cutoff {
            self.shake = 0.0;
            return Vec2::ZERO;
        }
        let dx = (self.rng.gen::<f32>() - 0.5) * self.shake;
        let dy = (self.rng.gen::<f32>() - 0.5) * self.shake;
        self.shake *= style.shake_decay;
        Vec2::new(dx, dy)
    }

    /// Flash and wobbling ring on top of whatever mode is showing
    pub fn draw_overlay(&mut self, input: &FrameInput<'_>, style: &SigmaStyle, frame: &mut Frame) {
        if self.flash > 0.01 {
            frame.fill_rect(Vec2::ZERO, input.size, orange(self.flash));
            self.flash *= style.flash_decay;
        } else {
            self.flash = 0.0;
        }

        let wobble = (input.elapsed_s as f32 * style.ring_wobble_rate).sin() * style.ring_wobble;
        frame.stroke_circle(input.center(), style.ring_radius + wobble, orange(0.7), 4.0);
    }

    /// Sigma mode body: concentric rings swelling with bass
    pub fn draw_rings(&mut self, input: &FrameInput<'_>, style: &SigmaStyle, frame: &mut Frame) {
        let swell = 1.0 + input.loudness.bass_unit() * 0.5;
        for k in 0..style.mode_rings {
            let radius = (style.ring_radius + k as f32 * style.mode_ring_spacing) * swell;
            let alpha = 0.8 / (k + 1) as f32;
            frame.stroke_circle(input.center(), radius, orange(alpha), 2.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawCommand;
    use crate::metric::Loudness;

    fn input(bass: f32) -> FrameInput<'static> {
        FrameInput {
            spectrum: &[],
            waveform: &[],
            loudness: Loudness { average: 0.0, bass },
            beat: None,
            elapsed_s: 0.0,
            size: Vec2::new(800.0, 400.0),
            speed: 1.0,
        }
    }

    #[test]
    fn test_no_shake_without_beat() {
        let style = SigmaStyle::default();
        let mut state = SigmaState::new(&style);
        for _ in 0..10 {
            assert_eq!(state.shake_offset(&style), Vec2::ZERO);
        }
    }

    #[test]
    fn test_shake_bounded_and_decays_to_rest() {
        let style = SigmaStyle::default();
        let mut state = SigmaState::new(&style);
        state.on_beat(&style);

        let first = state.shake_offset(&style);
        assert!(first.x.abs() <= 4.0 && first.y.abs() <= 4.0);
        assert!((state.shake - 7.2).abs() < 1e-5);

        for _ in 0..200 {
            state.shake_offset(&style);
        }
        assert_eq!(state.shake, 0.0);
        assert_eq!(state.shake_offset(&style), Vec2::ZERO);
    }

    #[test]
    fn test_flash_only_after_beat() {
        let style = SigmaStyle::default();
        let mut state = SigmaState::new(&style);
        let mut frame = Frame::default();

        state.draw_overlay(&input(0.0), &style, &mut frame);
        assert_eq!(frame.commands.len(), 1, "ring only");

        state.on_beat(&style);
        frame.commands.clear();
        state.draw_overlay(&input(0.0), &style, &mut frame);
        assert!(matches!(frame.commands[0], DrawCommand::Rect { .. }));
        assert_eq!(frame.commands.len(), 2);
    }

    #[test]
    fn test_mode_rings_swell_with_bass() {
        let style = SigmaStyle::default();
        let mut state = SigmaState::new(&style);
        let radii = |state: &mut SigmaState, bass: f32| {
            let mut frame = Frame::default();
            state.draw_rings(&input(bass), &style, &mut frame);
            frame
                .commands
                .iter()
                .map(|c| match c {
                    DrawCommand::Circle { radius, .. } => *radius,
                    _ => panic!("rings only"),
                })
                .collect::<Vec<_>>()
        };

        let quiet = radii(&mut state, 0.0);
        let loud = radii(&mut state, 255.0);
        assert_eq!(quiet, vec![120.0, 170.0, 220.0]);
        assert!(loud.iter().zip(&quiet).all(|(l, q)| l > q));
    }
}
