//! CSS-compatible timing functions.
//!
//! These back the named entries of the [`CurveLibrary`](crate::curve::CurveLibrary):
//! - Linear
//! - Ease, EaseIn, EaseOut, EaseInOut
//! - CubicBezier with caller-supplied control points
//! - Steps (`step-start` / `step-end`)
//!
//! Bezier curves are solved numerically; [`EasingFunction::evaluate_for`]
//! derives the solver precision from the animation duration so that long
//! animations do not visibly stutter.
//!
//! # Usage
//!
//! ```
//! use rune_motion::easing::EasingFunction;
//!
//! let ease = EasingFunction::Ease;
//! let progress = ease.evaluate(0.5);
//!
//! let custom = EasingFunction::from_name("ease-out").unwrap();
//! let progress = custom.evaluate_for(0.5, 500.0);
//! ```

use serde::{Deserialize, Serialize};

/// Solver precision used when no duration is known.
const DEFAULT_EPSILON: f64 = 1e-6;

/// Position for stepped animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// Jump at the start of each interval (CSS `jump-start` / `start`).
    Start,
    /// Jump at the end of each interval (CSS `jump-end` / `end`).
    #[default]
    End,
}

/// Easing function for animation timing.
///
/// Easing functions map a linear progress value (0.0 to 1.0) to an eased
/// output value, controlling the rate of change over time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    /// Linear interpolation (no easing).
    #[default]
    Linear,

    /// CSS `ease`, equivalent to `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,

    /// CSS `ease-in`, equivalent to `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,

    /// CSS `ease-out`, equivalent to `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,

    /// CSS `ease-in-out`, equivalent to `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,

    /// Custom cubic bezier curve through `(0,0)`, `(x1,y1)`, `(x2,y2)`, `(1,1)`.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },

    /// Stepped animation with discrete jumps.
    Steps { count: u32, position: StepPosition },
}

impl EasingFunction {
    /// Look up a standard curve by its CSS name.
    pub fn from_name(name: &str) -> Option<Self> {
        let easing = match name {
            "linear" => Self::Linear,
            "ease" => Self::Ease,
            "ease-in" => Self::EaseIn,
            "ease-out" => Self::EaseOut,
            "ease-in-out" => Self::EaseInOut,
            "step-start" => Self::Steps {
                count: 1,
                position: StepPosition::Start,
            },
            "step-end" => Self::Steps {
                count: 1,
                position: StepPosition::End,
            },
            _ => return None,
        };
        Some(easing)
    }

    /// CSS names understood by [`EasingFunction::from_name`].
    pub const NAMES: [&'static str; 7] = [
        "linear",
        "ease",
        "ease-in",
        "ease-out",
        "ease-in-out",
        "step-start",
        "step-end",
    ];

    /// Evaluate the easing function at the given progress.
    ///
    /// Input is clamped to `[0, 1]`; bezier output may leave that range.
    pub fn evaluate(&self, t: f64) -> f64 {
        self.evaluate_with_epsilon(t, DEFAULT_EPSILON)
    }

    /// Evaluate with a solver precision matched to an animation of
    /// `duration_ms` milliseconds.
    pub fn evaluate_for(&self, t: f64, duration_ms: f64) -> f64 {
        self.evaluate_with_epsilon(t, solve_epsilon(duration_ms))
    }

    fn evaluate_with_epsilon(&self, t: f64, epsilon: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match *self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t, epsilon),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t, epsilon),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t, epsilon),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t, epsilon),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t, epsilon),
            Self::Steps { count, position } => stepped(count, position, t),
        }
    }
}

/// Precision needed to keep bezier error below one frame of a `duration_ms`
/// animation.
pub fn solve_epsilon(duration_ms: f64) -> f64 {
    if duration_ms.is_finite() && duration_ms > 0.0 {
        1.0 / (200.0 * duration_ms)
    } else {
        DEFAULT_EPSILON
    }
}

/// Evaluate a cubic bezier curve at progress `x`.
///
/// Newton-Raphson finds the curve parameter for `x`; bisection takes over
/// when the derivative flattens out.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64, epsilon: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress, epsilon);
    bezier_y(y1, y2, t)
}

fn solve_bezier_x(x1: f64, x2: f64, target_x: f64, epsilon: f64) -> f64 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_x(x1, x2, t) - target_x;
        if x.abs() < epsilon {
            return t;
        }

        let dx = bezier_x_derivative(x1, x2, t);
        if dx.abs() < 1e-6 {
            break;
        }

        t -= x / dx;
        t = t.clamp(0.0, 1.0);
    }

    // Bisection fallback
    let (mut lo, mut hi) = (0.0, 1.0);
    t = target_x;
    while lo < hi {
        let x = bezier_x(x1, x2, t);
        if (x - target_x).abs() < epsilon {
            break;
        }
        if target_x > x {
            lo = t;
        } else {
            hi = t;
        }
        let next = (hi - lo) * 0.5 + lo;
        if next == t {
            break;
        }
        t = next;
    }

    t
}

/// x(t) = 3(1-t)²t·x1 + 3(1-t)t²·x2 + t³
#[inline]
fn bezier_x(x1: f64, x2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;

    3.0 * mt2 * t * x1 + 3.0 * mt * t2 * x2 + t3
}

#[inline]
fn bezier_y(y1: f64, y2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;

    3.0 * mt2 * t * y1 + 3.0 * mt * t2 * y2 + t3
}

/// dx/dt = 3(1-t)²·x1 + 6(1-t)t·(x2-x1) + 3t²·(1-x2)
#[inline]
fn bezier_x_derivative(x1: f64, x2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}

fn stepped(steps: u32, position: StepPosition, t: f64) -> f64 {
    if steps == 0 {
        return t;
    }

    let steps_f = f64::from(steps);

    match position {
        StepPosition::Start => (t * steps_f).ceil() / steps_f,
        StepPosition::End => (t * steps_f).floor() / steps_f,
    }
}
