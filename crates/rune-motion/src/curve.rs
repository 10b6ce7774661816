//! Timing curve resolution.
//!
//! A [`Curve`] is what the caller asks for: a curve name, a `cubic-bezier(...)`
//! text, or a custom function. [`CurveLibrary::resolve`] turns it into a
//! [`TimingFn`] exactly once, when an animation starts; the stepper never
//! re-dispatches on the curve kind per frame.
//!
//! Resolution never fails. Unknown names fall back to linear.
//!
//! # Example
//!
//! ```
//! use rune_motion::curve::{Curve, CurveLibrary};
//!
//! let library = CurveLibrary::default();
//!
//! let curve: Curve = "cubic-bezier(0.4, 0.0, 0.2, 1.0)".into();
//! let timing = library.resolve(&curve, Some(300.0));
//! assert!((timing(1.0) - 1.0).abs() < 1e-9);
//!
//! let unknown = library.resolve(&Curve::named("wobble"), Some(300.0));
//! assert_eq!(unknown(0.25), 0.25);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::easing::EasingFunction;
use crate::error::{MotionError, Result};

/// A resolved `percent -> eased value` mapping.
pub type TimingFn = Rc<dyn Fn(f64) -> f64>;

/// Builds a [`TimingFn`] for a given duration in milliseconds.
pub type CurveFactory = Rc<dyn Fn(f64) -> TimingFn>;

const BEZIER_PREFIX: &str = "cubic-bezier(";

/// Curve requested by an animation descriptor.
#[derive(Clone)]
pub enum Curve {
    /// A name looked up in the [`CurveLibrary`].
    Named(String),
    /// A caller-supplied factory, called once with the run duration.
    Custom(CurveFactory),
    /// An explicit cubic bezier, usually parsed from `cubic-bezier(a,b,c,d)`.
    Bezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Default for Curve {
    fn default() -> Self {
        Self::Named("linear".to_string())
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Bezier { x1, y1, x2, y2 } => f
                .debug_struct("Bezier")
                .field("x1", x1)
                .field("y1", y1)
                .field("x2", x2)
                .field("y2", y2)
                .finish(),
        }
    }
}

impl Curve {
    /// Reference a curve by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wrap a plain `percent -> value` function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        let timing: TimingFn = Rc::new(f);
        Self::Custom(Rc::new(move |_duration| timing.clone()))
    }

    /// Wrap a factory that specializes the curve for the run duration.
    pub fn custom_with_duration<F>(factory: F) -> Self
    where
        F: Fn(f64) -> TimingFn + 'static,
    {
        Self::Custom(Rc::new(factory))
    }

    /// An explicit cubic bezier curve.
    pub fn bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::Bezier { x1, y1, x2, y2 }
    }

    /// Parse a curve identifier.
    ///
    /// Text containing `cubic-bezier(` must carry four finite numeric
    /// components; anything else is kept as a name. Control points are not
    /// range-checked.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        match trimmed.find(BEZIER_PREFIX) {
            Some(idx) => parse_bezier(input, &trimmed[idx + BEZIER_PREFIX.len()..]),
            None => Ok(Self::Named(trimmed.to_string())),
        }
    }
}

fn parse_bezier(input: &str, body: &str) -> Result<Curve> {
    let invalid = |reason: String| MotionError::InvalidCurve {
        input: input.to_string(),
        reason,
    };

    let body = body
        .trim_end()
        .strip_suffix(')')
        .ok_or_else(|| invalid("missing closing parenthesis".to_string()))?;

    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(invalid(format!("expected 4 components, found {}", parts.len())));
    }

    let mut values = [0.0f64; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        let value: f64 = part
            .parse()
            .map_err(|_| invalid(format!("`{part}` is not a number")))?;
        if !value.is_finite() {
            return Err(invalid(format!("`{part}` is not finite")));
        }
        *slot = value;
    }

    let [x1, y1, x2, y2] = values;
    Ok(Curve::Bezier { x1, y1, x2, y2 })
}

impl FromStr for Curve {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&str> for Curve {
    /// Lenient conversion: a malformed bezier is kept as a name, which then
    /// resolves to linear.
    fn from(s: &str) -> Self {
        match Self::parse(s) {
            Ok(curve) => curve,
            Err(err) => {
                log::warn!("{err}; falling back to linear");
                Self::Named(s.trim().to_string())
            }
        }
    }
}

impl From<String> for Curve {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

fn linear() -> TimingFn {
    Rc::new(|percent| percent)
}

/// Injectable table of named curves.
///
/// [`CurveLibrary::default`] holds the standard CSS names; callers can
/// [`register`](CurveLibrary::register) their own.
#[derive(Clone)]
pub struct CurveLibrary {
    curves: HashMap<String, CurveFactory>,
}

impl Default for CurveLibrary {
    fn default() -> Self {
        let mut library = Self::empty();
        for name in EasingFunction::NAMES {
            let Some(easing) = EasingFunction::from_name(name) else {
                continue;
            };
            if easing == EasingFunction::Linear {
                library.register(name, |_duration| linear());
            } else {
                library.register(name, move |duration| -> TimingFn {
                    Rc::new(move |percent| easing.evaluate_for(percent, duration))
                });
            }
        }
        library
    }
}

impl fmt::Debug for CurveLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.curves.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("CurveLibrary").field("curves", &names).finish()
    }
}

impl CurveLibrary {
    /// A library with no named curves; every name resolves to linear.
    pub fn empty() -> Self {
        Self {
            curves: HashMap::new(),
        }
    }

    /// Register (or replace) a named curve.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(f64) -> TimingFn + 'static,
    {
        self.curves.insert(name.into(), Rc::new(factory));
    }

    /// Whether a name is known to this library.
    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    /// Build the named curve for a run of `duration_ms`.
    pub fn lookup(&self, name: &str, duration_ms: f64) -> Option<TimingFn> {
        self.curves.get(name).map(|factory| factory(duration_ms))
    }

    /// Build a bezier evaluator bound to its control points and duration.
    pub fn bezier(&self, x1: f64, y1: f64, x2: f64, y2: f64, duration_ms: f64) -> TimingFn {
        let easing = EasingFunction::CubicBezier { x1, y1, x2, y2 };
        Rc::new(move |percent| easing.evaluate_for(percent, duration_ms))
    }

    /// Resolve a curve for a run. Never fails; unknown names become linear.
    pub fn resolve(&self, curve: &Curve, duration_ms: Option<f64>) -> TimingFn {
        let duration = duration_ms.unwrap_or(0.0);
        match curve {
            Curve::Named(name) => self.lookup(name, duration).unwrap_or_else(|| {
                log::debug!("unknown curve `{name}`, using linear");
                linear()
            }),
            Curve::Custom(factory) => factory(duration),
            Curve::Bezier { x1, y1, x2, y2 } => self.bezier(*x1, *y1, *x2, *y2, duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_parse_named() {
        let curve = Curve::parse(" ease-out ").unwrap();
        assert!(matches!(curve, Curve::Named(ref n) if n == "ease-out"));
    }

    #[test]
    fn test_parse_bezier() {
        let curve = Curve::parse("cubic-bezier(0.1, 0.7, 1.0, 0.1)").unwrap();
        match curve {
            Curve::Bezier { x1, y1, x2, y2 } => {
                assert_eq!((x1, y1, x2, y2), (0.1, 0.7, 1.0, 0.1));
            }
            other => panic!("expected bezier, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_bezier_errors() {
        assert!(Curve::parse("cubic-bezier(0.1, 0.7, 1.0)").is_err());
        assert!(Curve::parse("cubic-bezier(0.1, a, 1.0, 0.1)").is_err());
        assert!(Curve::parse("cubic-bezier(0.1, 0.7, 1.0, 0.1").is_err());
        assert!(Curve::parse("cubic-bezier(0.1, inf, 1.0, 0.1)").is_err());
    }

    #[test]
    fn test_out_of_range_control_points_still_build_a_bezier() {
        let curve: Curve = "cubic-bezier(1.5, 0.7, -0.2, 0.1)".into();
        assert!(matches!(
            curve,
            Curve::Bezier { x1, x2, .. } if x1 == 1.5 && x2 == -0.2
        ));

        let timing = CurveLibrary::default().resolve(&curve, Some(400.0));
        assert_eq!(timing(0.0), 0.0);
        assert_eq!(timing(1.0), 1.0);
        assert!(timing(0.5).is_finite());
    }

    #[test]
    fn test_lenient_conversion_falls_back_to_linear() {
        let curve: Curve = "cubic-bezier(oops)".into();
        assert!(matches!(curve, Curve::Named(_)));

        let timing = CurveLibrary::default().resolve(&curve, Some(500.0));
        assert_eq!(timing(0.3), 0.3);
    }

    #[test]
    fn test_unknown_name_is_identity() {
        let timing = CurveLibrary::default().resolve(&Curve::named("nope"), Some(500.0));
        for p in [0.0, 0.2, 0.5, 1.0] {
            assert_eq!(timing(p), p);
        }
    }

    #[test]
    fn test_standard_names_registered() {
        let library = CurveLibrary::default();
        for name in EasingFunction::NAMES {
            assert!(library.contains(name));
        }
        let ease_in = library.lookup("ease-in", 400.0).unwrap();
        assert!(ease_in(0.25) < 0.25);
    }

    #[test]
    fn test_custom_factory_receives_duration() {
        let seen = Rc::new(Cell::new(0.0));
        let seen_inner = seen.clone();
        let curve = Curve::custom_with_duration(move |duration| {
            seen_inner.set(duration);
            Rc::new(|p: f64| p * p)
        });

        let timing = CurveLibrary::default().resolve(&curve, Some(750.0));
        assert_eq!(seen.get(), 750.0);
        assert!(approx_eq(timing(0.5), 0.25));
    }

    #[test]
    fn test_bezier_resolution() {
        let library = CurveLibrary::default();
        let timing = library.resolve(&Curve::bezier(0.42, 0.0, 0.58, 1.0), Some(1000.0));
        let ease_in_out = library.lookup("ease-in-out", 1000.0).unwrap();
        for p in [0.1, 0.5, 0.9] {
            assert!(approx_eq(timing(p), ease_in_out(p)));
        }
    }

    #[test]
    fn test_register_custom_name() {
        let mut library = CurveLibrary::empty();
        assert!(!library.contains("ease"));
        library.register("half", |_| Rc::new(|p: f64| p / 2.0));
        let timing = library.resolve(&Curve::named("half"), None);
        assert!(approx_eq(timing(1.0), 0.5));
    }
}
