//! Retained 2D drawing commands for one frame.
//!
//! Mode routines append commands in canvas pixel coordinates (origin top
//! left, y down). The GPU backend tessellates them; tests inspect them.

use glam::Vec2;

use crate::modes::RenderMode;

/// Linear RGBA colour, components 0-1
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 8-bit channels plus 0-1 alpha
    pub fn rgba8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
    }

    /// Hue in degrees (any value, wrapped), saturation and lightness 0-1
    pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        Self::rgba(r + m, g + m, b + m, alpha.clamp(0.0, 1.0))
    }

    pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self::hsla(hue, saturation, lightness, 1.0)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Stroke or fill for closed shapes
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint {
    Stroke { width: f32 },
    Fill,
}

/// One drawing primitive
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Connected line through all points
    Polyline {
        points: Vec<Vec2>,
        color: Color,
        width: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
        width: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
        paint: Paint,
    },
    /// Axis-aligned filled rectangle
    Rect { min: Vec2, size: Vec2, color: Color },
}

/// What happens to the previous canvas contents before drawing
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Background {
    /// Replace with a solid colour
    Clear(Color),
    /// Paint a translucent colour over the previous frame (motion trails)
    Fade(Color),
}

impl Default for Background {
    fn default() -> Self {
        Background::Clear(Color::BLACK)
    }
}

/// Everything needed to paint one frame
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub background: Background,
    /// Whole-canvas translation (pixels), applied to every command
    pub offset: Vec2,
    pub commands: Vec<DrawCommand>,
    /// Mode that produced this frame
    pub mode: Option<RenderMode>,
    /// Canvas size this frame was laid out for (pixels)
    pub size: Vec2,
}

impl Frame {
    /// Start a new frame, keeping the command allocation
    pub fn begin(&mut self, size: Vec2, background: Background, mode: RenderMode) {
        self.commands.clear();
        self.background = background;
        self.offset = Vec2::ZERO;
        self.mode = Some(mode);
        self.size = size;
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn polyline(&mut self, points: Vec<Vec2>, color: Color, width: f32) {
        if points.len() >= 2 {
            self.push(DrawCommand::Polyline {
                points,
                color,
                width,
            });
        }
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        self.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    pub fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, width: f32) {
        self.push(DrawCommand::Circle {
            center,
            radius,
            color,
            paint: Paint::Stroke { width },
        });
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.push(DrawCommand::Circle {
            center,
            radius,
            color,
            paint: Paint::Fill,
        });
    }

    pub fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Color) {
        self.push(DrawCommand::Rect { min, size, color });
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color, b: Color) -> bool {
        (a.r - b.r).abs() < 1e-3
            && (a.g - b.g).abs() < 1e-3
            && (a.b - b.b).abs() < 1e-3
            && (a.a - b.a).abs() < 1e-3
    }

    #[test]
    fn test_hsl_primaries() {
        assert!(close(Color::hsl(0.0, 1.0, 0.5), Color::rgba(1.0, 0.0, 0.0, 1.0)));
        assert!(close(Color::hsl(120.0, 1.0, 0.5), Color::rgba(0.0, 1.0, 0.0, 1.0)));
        assert!(close(Color::hsl(240.0, 1.0, 0.5), Color::rgba(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_hue_wraps() {
        assert!(close(Color::hsl(360.0 + 120.0, 1.0, 0.5), Color::hsl(120.0, 1.0, 0.5)));
        assert!(close(Color::hsl(-120.0, 1.0, 0.5), Color::hsl(240.0, 1.0, 0.5)));
    }

    #[test]
    fn test_degenerate_polyline_dropped() {
        let mut frame = Frame::default();
        frame.polyline(vec![Vec2::ZERO], Color::WHITE, 1.0);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_begin_resets_frame() {
        let mut frame = Frame::default();
        frame.offset = Vec2::new(3.0, 4.0);
        frame.fill_circle(Vec2::ZERO, 1.0, Color::WHITE);

        frame.begin(Vec2::new(100.0, 50.0), Background::default(), RenderMode::Wave);
        assert!(frame.is_empty());
        assert_eq!(frame.offset, Vec2::ZERO);
        assert_eq!(frame.mode, Some(RenderMode::Wave));
    }
}
