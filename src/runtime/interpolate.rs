use crate::types::color::Color;
use crate::types::value::Value;

/// Curve mapping an input between two stops to an interpolation factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Curve {
    Linear,
    Exponential { base: f64 },
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Curve {
    /// Factor in `[0, 1]` for `input` between `lower` and `upper`.
    pub(crate) fn factor(self, input: f64, lower: f64, upper: f64) -> f64 {
        match self {
            Self::Linear => exponential_factor(input, 1.0, lower, upper),
            Self::Exponential { base } => exponential_factor(input, base, lower, upper),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                let t = exponential_factor(input, 1.0, lower, upper);
                UnitBezier::new(x1, y1, x2, y2).solve(t)
            }
        }
    }

    /// Canonical `["linear"]` / `["exponential", b]` / `["cubic-bezier", ...]` form.
    pub(crate) fn to_json(self) -> serde_json::Value {
        match self {
            Self::Linear => serde_json::json!(["linear"]),
            Self::Exponential { base } => serde_json::json!(["exponential", base]),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                serde_json::json!(["cubic-bezier", x1, y1, x2, y2])
            }
        }
    }
}

fn exponential_factor(input: f64, base: f64, lower: f64, upper: f64) -> f64 {
    let difference = upper - lower;
    let progress = input - lower;
    if difference == 0.0 {
        0.0
    } else if base == 1.0 {
        progress / difference
    } else {
        (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
    }
}

/// Cubic bezier from `(0, 0)` to `(1, 1)` with two free control points,
/// solved for `y` given `x`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UnitBezier {
    cx: f64,
    bx: f64,
    ax: f64,
    cy: f64,
    by: f64,
    ay: f64,
}

impl UnitBezier {
    const EPSILON: f64 = 1e-6;

    pub(crate) fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        let ay = 1.0 - cy - by;
        Self {
            cx,
            bx,
            ax,
            cy,
            by,
            ay,
        }
    }

    fn sample_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_dx(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    fn solve_x(&self, x: f64) -> f64 {
        // Newton first, bisection when the slope flattens out.
        let mut t = x;
        for _ in 0..8 {
            let err = self.sample_x(t) - x;
            if err.abs() < Self::EPSILON {
                return t;
            }
            let d = self.sample_dx(t);
            if d.abs() < Self::EPSILON {
                break;
            }
            t -= err / d;
        }

        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        t = x;
        if t < lo {
            return lo;
        }
        if t > hi {
            return hi;
        }
        while lo < hi {
            let sx = self.sample_x(t);
            if (sx - x).abs() < Self::EPSILON {
                return t;
            }
            if x > sx {
                lo = t;
            } else {
                hi = t;
            }
            t = (hi - lo) * 0.5 + lo;
            if hi - lo < Self::EPSILON {
                break;
            }
        }
        t
    }

    pub(crate) fn solve(&self, x: f64) -> f64 {
        self.sample_y(self.solve_x(x))
    }
}

/// Index of the last stop `<= input`, clamped to the valid range.
pub(crate) fn stop_index(stops: &[f64], input: f64) -> usize {
    stops.partition_point(|s| *s <= input).saturating_sub(1)
}

/// Blend two stop outputs of the same interpolatable shape.
pub(crate) fn blend(a: &Value, b: &Value, t: f64) -> Result<Value, String> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + (b - a) * t)),
        (Value::Color(a), Value::Color(b)) => Ok(Value::Color(Color::lerp(*a, *b, t))),
        (Value::Array(a), Value::Array(b)) if a.len() == b.len() => a
            .iter()
            .zip(b)
            .map(|(x, y)| match (x, y) {
                (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + (y - x) * t)),
                _ => {
                    let bad = if matches!(x, Value::Number(_)) { y } else { x };
                    Err(format!(
                        "Cannot interpolate array item of type {}.",
                        bad.type_of()
                    ))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (Value::Array(a), Value::Array(b)) => Err(format!(
            "Cannot interpolate arrays of different lengths ({} and {}).",
            a.len(),
            b.len()
        )),
        _ => Err(format!(
            "Cannot interpolate between {} and {}.",
            a.type_of(),
            b.type_of()
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/interpolate.rs"]
mod tests;
