//! CPU tessellation of draw commands into coloured triangles.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::canvas::{Background, Color, DrawCommand, Frame, Paint};

/// Vertex in canvas pixel space
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Thinnest stroke that still covers a pixel
const MIN_STROKE: f32 = 1.0;

/// Turns a [`Frame`] into a triangle list, reusing its buffer between frames
#[derive(Debug)]
pub struct Tessellator {
    circle_segments: usize,
    vertices: Vec<Vertex>,
}

impl Tessellator {
    pub fn new(circle_segments: usize) -> Self {
        Self {
            circle_segments: circle_segments.max(3),
            vertices: Vec::new(),
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangles for `frame`; a fading background becomes a full-canvas quad first
    pub fn tessellate(&mut self, frame: &Frame) -> &[Vertex] {
        self.vertices.clear();

        if let Background::Fade(color) = frame.background {
            self.rect(Vec2::ZERO, frame.size, color);
        }

        let offset = frame.offset;
        for command in &frame.commands {
            match command {
                DrawCommand::Polyline {
                    points,
                    color,
                    width,
                } => {
                    for pair in points.windows(2) {
                        self.segment(pair[0] + offset, pair[1] + offset, *color, *width);
                    }
                }
                DrawCommand::Line {
                    from,
                    to,
                    color,
                    width,
                } => self.segment(*from + offset, *to + offset, *color, *width),
                DrawCommand::Circle {
                    center,
                    radius,
                    color,
                    paint,
                } => match paint {
                    Paint::Fill => self.disc(*center + offset, *radius, *color),
                    Paint::Stroke { width } => {
                        self.ring(*center + offset, *radius, *color, *width)
                    }
                },
                DrawCommand::Rect { min, size, color } => self.rect(*min + offset, *size, *color),
            }
        }

        &self.vertices
    }

    fn triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        let color = color.to_array();
        for p in [a, b, c] {
            self.vertices.push(Vertex {
                position: p.to_array(),
                color,
            });
        }
    }

    fn quad(&mut self, a: Vec2, b: Vec2, c: Vec2, d: Vec2, color: Color) {
        // a,b span one edge and c,d the opposite one
        self.triangle(a, b, c, color);
        self.triangle(c, b, d, color);
    }

    fn segment(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        let dir = to - from;
        let len = dir.length();
        if !len.is_finite() || len < f32::EPSILON {
            return;
        }
        let normal = dir.perp() / len * (width.max(MIN_STROKE) * 0.5);
        self.quad(from + normal, from - normal, to + normal, to - normal, color);
    }

    fn rect(&mut self, min: Vec2, size: Vec2, color: Color) {
        let max = min + size;
        self.quad(
            min,
            Vec2::new(max.x, min.y),
            Vec2::new(min.x, max.y),
            max,
            color,
        );
    }

    fn disc(&mut self, center: Vec2, radius: f32, color: Color) {
        if !(radius > 0.0) {
            return;
        }
        let n = self.circle_segments;
        for k in 0..n {
            let a = center + Vec2::from_angle(TAU * k as f32 / n as f32) * radius;
            let b = center + Vec2::from_angle(TAU * (k + 1) as f32 / n as f32) * radius;
            self.triangle(center, a, b, color);
        }
    }

    fn ring(&mut self, center: Vec2, radius: f32, color: Color, width: f32) {
        if !(radius > 0.0) {
            return;
        }
        let half = width.max(MIN_STROKE) * 0.5;
        let inner = (radius - half).max(0.0);
        let outer = radius + half;
        let n = self.circle_segments;
        for k in 0..n {
            let u = Vec2::from_angle(TAU * k as f32 / n as f32);
            let v = Vec2::from_angle(TAU * (k + 1) as f32 / n as f32);
            self.quad(
                center + u * outer,
                center + u * inner,
                center + v * outer,
                center + v * inner,
                color,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::RenderMode;

    fn frame() -> Frame {
        let mut frame = Frame::default();
        frame.begin(Vec2::new(100.0, 50.0), Background::default(), RenderMode::Wave);
        frame
    }

    #[test]
    fn test_line_is_one_quad() {
        let mut frame = frame();
        frame.line(Vec2::ZERO, Vec2::new(10.0, 0.0), Color::WHITE, 4.0);

        let mut tess = Tessellator::new(16);
        let vertices = tess.tessellate(&frame);
        assert_eq!(vertices.len(), 6);
        let ys: Vec<f32> = vertices.iter().map(|v| v.position[1]).collect();
        assert!(ys.iter().all(|y| y.abs() == 2.0));
    }

    #[test]
    fn test_polyline_segments() {
        let mut frame = frame();
        let points = (0..5).map(|i| Vec2::new(i as f32 * 10.0, 25.0)).collect();
        frame.polyline(points, Color::WHITE, 2.0);

        let mut tess = Tessellator::new(16);
        assert_eq!(tess.tessellate(&frame).len(), 4 * 6);
    }

    #[test]
    fn test_zero_length_segment_skipped() {
        let mut frame = frame();
        frame.line(Vec2::ONE, Vec2::ONE, Color::WHITE, 2.0);

        let mut tess = Tessellator::new(16);
        assert!(tess.tessellate(&frame).is_empty());
    }

    #[test]
    fn test_circles() {
        let mut frame = frame();
        frame.fill_circle(Vec2::new(50.0, 25.0), 5.0, Color::WHITE);
        frame.stroke_circle(Vec2::new(50.0, 25.0), 10.0, Color::WHITE, 2.0);
        frame.fill_circle(Vec2::new(50.0, 25.0), 0.0, Color::WHITE);

        let mut tess = Tessellator::new(12);
        let vertices = tess.tessellate(&frame);
        assert_eq!(vertices.len(), 12 * 3 + 12 * 6);

        let center = Vec2::new(50.0, 25.0);
        for v in &vertices[36..] {
            let r = Vec2::from(v.position).distance(center);
            assert!((9.0 - 1e-3..=11.0 + 1e-3).contains(&r));
        }
    }

    #[test]
    fn test_fade_quad_ignores_offset() {
        let mut frame = Frame::default();
        let fade = Color::rgba8(5, 5, 20, 0.3);
        frame.begin(Vec2::new(100.0, 50.0), Background::Fade(fade), RenderMode::Galaxy);
        frame.offset = Vec2::new(3.0, -2.0);
        frame.fill_rect(Vec2::ZERO, Vec2::new(10.0, 10.0), Color::WHITE);

        let mut tess = Tessellator::new(8);
        let vertices = tess.tessellate(&frame);
        assert_eq!(vertices.len(), 12);
        assert_eq!(vertices[0].position, [0.0, 0.0]);
        assert_eq!(vertices[0].color, fade.to_array());
        assert_eq!(vertices[6].position, [3.0, -2.0]);
    }
}
