//! 2D similarity transforms and colors.
//!
//! Coordinates follow the format's convention: +x right, +y up, angles in
//! degrees counter-clockwise, multiplicative scale. Renderer-specific flips are
//! applied by the renderer's conversion hook, never here.

use serde::{Deserialize, Serialize};

use crate::interp::functions::{lerp_angle, lerp_f32, wrap_degrees};

/// Rotational direction used when blending angles between two keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spin {
    /// Decreasing angle; the traversed arc is <= 0.
    Clockwise,
    /// Angle frozen at the left key.
    None,
    /// Increasing angle; the traversed arc is >= 0. The format default.
    #[default]
    CounterClockwise,
    /// Shortest arc. Only for programmatic blends; documents never carry it.
    Shortest,
}

impl Spin {
    /// Map the document's signed spin value.
    pub fn from_document(raw: i64) -> Self {
        match raw.signum() {
            1 => Spin::CounterClockwise,
            -1 => Spin::Clockwise,
            _ => Spin::None,
        }
    }
}

/// Position, angle and per-axis scale. No shear.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        x: 0.0,
        y: 0.0,
        angle: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub const fn new(x: f32, y: f32, angle: f32, scale_x: f32, scale_y: f32) -> Self {
        Self {
            x,
            y,
            angle,
            scale_x,
            scale_y,
        }
    }

    pub const fn from_position(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0, 1.0, 1.0)
    }

    /// Blend towards `b`. Position and scale are linear; the angle follows
    /// `spin`. `t` outside [0, 1] extrapolates.
    pub fn lerp(&self, b: &Transform, t: f32, spin: Spin) -> Transform {
        Transform {
            x: lerp_f32(self.x, b.x, t),
            y: lerp_f32(self.y, b.y, t),
            angle: lerp_angle(self.angle, b.angle, t, spin),
            scale_x: lerp_f32(self.scale_x, b.scale_x, t),
            scale_y: lerp_f32(self.scale_y, b.scale_y, t),
        }
    }

    /// Express this local transform in the parent's space: scale the offset by
    /// the parent's scale, rotate it by the parent's angle, translate by the
    /// parent's position. Scales multiply and angles add modulo 360.
    pub fn apply_parent(&mut self, parent: &Transform) {
        let x = self.x * parent.scale_x;
        let y = self.y * parent.scale_y;
        let (s, c) = parent.angle.to_radians().sin_cos();
        self.x = x * c - y * s + parent.x;
        self.y = x * s + y * c + parent.y;
        self.angle = wrap_degrees(self.angle + parent.angle);
        self.scale_x *= parent.scale_x;
        self.scale_y *= parent.scale_y;
    }

    /// `child` expressed in `parent`'s space.
    #[inline]
    pub fn compose(parent: &Transform, child: &Transform) -> Transform {
        let mut out = *child;
        out.apply_parent(parent);
        out
    }
}

/// Tint and opacity, each channel in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        Color {
            r: lerp_f32(self.r, other.r, t),
            g: lerp_f32(self.g, other.g, t),
            b: lerp_f32(self.b, other.b, t),
            a: lerp_f32(self.a, other.a, t),
        }
    }
}
