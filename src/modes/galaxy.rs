//! Falling starfield, orbiting dust and a beat-driven pulse ring.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FrameInput;
use crate::canvas::{Color, Frame};
use crate::params::GalaxyStyle;

/// Pulse impulse below which the ring is hidden
const PULSE_VISIBLE: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub position: Vec2,
    pub radius: f32,
    /// Fall speed (pixels per frame)
    pub speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dust {
    /// Orbit angle (radians)
    pub angle: f32,
    /// Orbit radius (pixels)
    pub distance: f32,
    /// Angular speed (radians per frame)
    pub speed: f32,
}

/// Galaxy mode state, seeded on first draw
#[derive(Debug)]
pub struct GalaxyState {
    pub stars: Vec<Star>,
    pub dust: Vec<Dust>,
    /// Pulse strength, 1 on beat, decaying per frame
    pub impulse: f32,
    rng: StdRng,
}

fn sample(rng: &mut StdRng, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

impl GalaxyState {
    pub fn new(style: &GalaxyStyle) -> Self {
        Self {
            stars: Vec::new(),
            dust: Vec::new(),
            impulse: 0.0,
            rng: StdRng::seed_from_u64(style.seed),
        }
    }

    pub fn on_beat(&mut self) {
        self.impulse = 1.0;
    }

    /// Create particles if missing (first use or after a count change)
    fn populate(&mut self, size: Vec2, style: &GalaxyStyle) {
        if self.stars.len() != style.star_count {
            let rng = &mut self.rng;
            self.stars = (0..style.star_count)
                .map(|_| Star {
                    position: Vec2::new(
                        sample(rng, (0.0, size.x)),
                        sample(rng, (0.0, size.y)),
                    ),
                    radius: sample(rng, style.star_radius),
                    speed: sample(rng, style.star_speed),
                })
                .collect();
        }
        if self.dust.len() != style.dust_count {
            let rng = &mut self.rng;
            self.dust = (0..style.dust_count)
                .map(|_| Dust {
                    angle: sample(rng, (0.0, std::f32::consts::TAU)),
                    distance: sample(rng, style.dust_distance),
                    speed: sample(rng, style.dust_speed),
                })
                .collect();
        }
    }

    /// Move every particle one frame
    pub fn advance(&mut self, size: Vec2, speed: f32, style: &GalaxyStyle) {
        self.populate(size, style);

        for star in &mut self.stars {
            star.position.y += star.speed * speed;
            if star.position.y > size.y {
                star.position.y = 0.0;
            }
            if size.x > 0.0 {
                star.position.x = star.position.x.rem_euclid(size.x);
            }
        }
        for mote in &mut self.dust {
            mote.angle = (mote.angle + mote.speed * speed).rem_euclid(std::f32::consts::TAU);
        }
    }

    pub fn draw(&mut self, input: &FrameInput<'_>, style: &GalaxyStyle, frame: &mut Frame) {
        // Draw at current positions, then advance (stars are painted before they move)
        self.populate(input.size, style);

        let star_color = Color::rgba8(0xff, 0xff, 0xff, 0xaa as f32 / 255.0);
        for star in &self.stars {
            if star.radius > 0.0 {
                frame.fill_circle(star.position, star.radius, star_color);
            }
        }

        self.advance(input.size, input.speed, style);

        let center = input.center();
        let dust_radius = style.dust_radius + input.loudness.bass_unit() * style.dust_swell;
        for (i, mote) in self.dust.iter().enumerate() {
            let position = center + Vec2::from_angle(mote.angle) * mote.distance;
            let color = Color::hsla(i as f32 * 6.0, 1.0, 0.6, 0.5);
            frame.fill_circle(position, dust_radius, color);
        }

        if self.impulse > PULSE_VISIBLE {
            let radius = style.pulse_radius + style.pulse_growth * self.impulse;
            let color = Color::rgba8(255, 0, 255, self.impulse);
            frame.stroke_circle(center, radius, color, 3.0);
            self.impulse *= style.pulse_decay;
        } else {
            self.impulse = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, Paint};
    use crate::metric::Loudness;

    fn input(size: Vec2) -> FrameInput<'static> {
        FrameInput {
            spectrum: &[],
            waveform: &[],
            loudness: Loudness::default(),
            beat: None,
            elapsed_s: 0.0,
            size,
            speed: 1.0,
        }
    }

    fn pulse_rings(frame: &Frame) -> usize {
        frame
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { paint: Paint::Stroke { .. }, .. }))
            .count()
    }

    #[test]
    fn test_seeded_once_with_configured_counts() {
        let style = GalaxyStyle::default();
        let mut state = GalaxyState::new(&style);
        let mut frame = Frame::default();
        state.draw(&input(Vec2::new(800.0, 400.0)), &style, &mut frame);

        assert_eq!(state.stars.len(), 100);
        assert_eq!(state.dust.len(), 60);
        for star in &state.stars {
            assert!((0.2..0.7).contains(&star.speed));
            assert!((0.0..1.5).contains(&star.radius));
        }
        for mote in &state.dust {
            assert!((100.0..250.0).contains(&mote.distance));
        }

        let first = state.stars.clone();
        state.draw(&input(Vec2::new(800.0, 400.0)), &style, &mut frame);
        assert_eq!(state.stars.len(), 100);
        assert_eq!(state.stars[0].radius, first[0].radius);
    }

    #[test]
    fn test_same_seed_same_sky() {
        let style = GalaxyStyle::default();
        let size = Vec2::new(640.0, 480.0);
        let mut a = GalaxyState::new(&style);
        let mut b = GalaxyState::new(&style);
        a.advance(size, 1.0, &style);
        b.advance(size, 1.0, &style);
        assert_eq!(a.stars, b.stars);
        assert_eq!(a.dust, b.dust);
    }

    #[test]
    fn test_stars_wrap_to_top() {
        let style = GalaxyStyle::default();
        let size = Vec2::new(100.0, 50.0);
        let mut state = GalaxyState::new(&style);

        for _ in 0..10_000 {
            state.advance(size, 3.0, &style);
            for star in &state.stars {
                assert!(star.position.y >= 0.0 && star.position.y <= size.y);
                assert!(star.position.x >= 0.0 && star.position.x < size.x);
            }
        }
    }

    #[test]
    fn test_pulse_follows_beat_and_decays() {
        let style = GalaxyStyle::default();
        let mut state = GalaxyState::new(&style);
        let size = Vec2::new(800.0, 400.0);
        let mut frame = Frame::default();

        state.draw(&input(size), &style, &mut frame);
        assert_eq!(pulse_rings(&frame), 0);

        state.on_beat();
        frame.commands.clear();
        state.draw(&input(size), &style, &mut frame);
        assert_eq!(pulse_rings(&frame), 1);
        assert!((state.impulse - 0.85).abs() < 1e-6);

        for _ in 0..100 {
            frame.commands.clear();
            state.draw(&input(size), &style, &mut frame);
        }
        assert_eq!(pulse_rings(&frame), 0);
        assert_eq!(state.impulse, 0.0);
    }
}
