//! Easing curves attached to timeline keys.
//!
//! A curve remaps the linear fraction between two keys before the poses are
//! blended. Polynomial curves are 1-D Bezier polynomials pinned to 0 and 1
//! with the key's `c` parameters as inner control values.

pub mod functions;

use serde::{Deserialize, Serialize};

use functions::{bezier_ease_t, cubic, quadratic, quartic, quintic};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Curve {
    /// Hold the left key's pose for the whole segment.
    Instant,
    #[default]
    Linear,
    Quadratic { c1: f32 },
    Cubic { c1: f32, c2: f32 },
    Quartic { c1: f32, c2: f32, c3: f32 },
    Quintic { c1: f32, c2: f32, c3: f32, c4: f32 },
    /// Cubic-bezier timing with control points (x1, y1) and (x2, y2).
    Bezier { x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl Curve {
    /// Build a curve from the format's `curve_type` name and its parameters.
    /// A missing name means linear. Returns `None` for unknown names.
    ///
    /// Keys normally carry `c1` and `c2` only. `c3`/`c4` are honoured when a
    /// document supplies them: quartic and quintic curves reuse the last given
    /// control value for an absent one, and `bezier` becomes a two-point
    /// timing curve only when both are present. Otherwise `bezier` is the
    /// cubic polynomial over `c1`, `c2`.
    pub fn from_parts(
        name: Option<&str>,
        c1: f32,
        c2: f32,
        c3: Option<f32>,
        c4: Option<f32>,
    ) -> Option<Self> {
        let curve = match name.unwrap_or("linear") {
            "instant" => Curve::Instant,
            "linear" => Curve::Linear,
            "quadratic" => Curve::Quadratic { c1 },
            "cubic" => Curve::Cubic { c1, c2 },
            "quartic" => Curve::Quartic {
                c1,
                c2,
                c3: c3.unwrap_or(c2),
            },
            "quintic" => {
                let c3 = c3.unwrap_or(c2);
                Curve::Quintic {
                    c1,
                    c2,
                    c3,
                    c4: c4.unwrap_or(c3),
                }
            }
            "bezier" => match (c3, c4) {
                (Some(x2), Some(y2)) => Curve::Bezier {
                    x1: c1,
                    y1: c2,
                    x2,
                    y2,
                },
                _ => Curve::Cubic { c1, c2 },
            },
            _ => return None,
        };
        Some(curve)
    }

    /// Remap a segment fraction. `Instant` always yields 0 so the blend stays
    /// on the left key.
    pub fn ease(&self, t: f32) -> f32 {
        match *self {
            Curve::Instant => 0.0,
            Curve::Linear => t,
            Curve::Quadratic { c1 } => quadratic(0.0, c1, 1.0, t),
            Curve::Cubic { c1, c2 } => cubic(0.0, c1, c2, 1.0, t),
            Curve::Quartic { c1, c2, c3 } => quartic(0.0, c1, c2, c3, 1.0, t),
            Curve::Quintic { c1, c2, c3, c4 } => quintic(0.0, c1, c2, c3, c4, 1.0, t),
            Curve::Bezier { x1, y1, x2, y2 } => bezier_ease_t(t, x1, y1, x2, y2),
        }
    }

    #[inline]
    pub fn is_instant(&self) -> bool {
        matches!(self, Curve::Instant)
    }
}
