//! Easing functions for animations

use std::fmt;
use std::str::FromStr;

use scrollwork_core::ScrollworkError;
use serde::{Deserialize, Serialize};

/// Easing function type
///
/// Parses from the identifiers page authors write: `none`, `linear`,
/// `power1.out` .. `power4.inOut`, `sine.inOut`, the CSS keywords
/// (`ease`, `ease-in`, `ease-out`, `ease-in-out`) and
/// `cubic-bezier(x1, y1, x2, y2)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInQuart => t * t * t * t,
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::EaseInQuint => t.powi(5),
            Easing::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Easing::EaseInSine => 1.0 - (t * std::f32::consts::FRAC_PI_2).cos(),
            Easing::EaseOutSine => (t * std::f32::consts::FRAC_PI_2).sin(),
            Easing::EaseInOutSine => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
        }
    }
}

impl FromStr for Easing {
    type Err = ScrollworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        let easing = match id {
            "none" | "linear" => Easing::Linear,
            "ease" => Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
            "ease-in" => Easing::CubicBezier(0.42, 0.0, 1.0, 1.0),
            "ease-out" => Easing::CubicBezier(0.0, 0.0, 0.58, 1.0),
            "ease-in-out" => Easing::CubicBezier(0.42, 0.0, 0.58, 1.0),
            // A bare power name eases out
            "power1" | "power1.out" => Easing::EaseOutQuad,
            "power1.in" => Easing::EaseInQuad,
            "power1.inOut" => Easing::EaseInOutQuad,
            "power2" | "power2.out" => Easing::EaseOutCubic,
            "power2.in" => Easing::EaseInCubic,
            "power2.inOut" => Easing::EaseInOutCubic,
            "power3" | "power3.out" => Easing::EaseOutQuart,
            "power3.in" => Easing::EaseInQuart,
            "power3.inOut" => Easing::EaseInOutQuart,
            "power4" | "power4.out" => Easing::EaseOutQuint,
            "power4.in" => Easing::EaseInQuint,
            "power4.inOut" => Easing::EaseInOutQuint,
            "sine" | "sine.out" => Easing::EaseOutSine,
            "sine.in" => Easing::EaseInSine,
            "sine.inOut" => Easing::EaseInOutSine,
            _ => return parse_cubic_bezier(id).ok_or_else(|| ScrollworkError::InvalidEasing(s.to_string())),
        };
        Ok(easing)
    }
}

impl TryFrom<String> for Easing {
    type Error = ScrollworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.to_string()
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            Easing::Linear => "linear",
            Easing::EaseInQuad => "power1.in",
            Easing::EaseOutQuad => "power1.out",
            Easing::EaseInOutQuad => "power1.inOut",
            Easing::EaseIn | Easing::EaseInCubic => "power2.in",
            Easing::EaseOut | Easing::EaseOutCubic => "power2.out",
            Easing::EaseInOut | Easing::EaseInOutCubic => "power2.inOut",
            Easing::EaseInQuart => "power3.in",
            Easing::EaseOutQuart => "power3.out",
            Easing::EaseInOutQuart => "power3.inOut",
            Easing::EaseInQuint => "power4.in",
            Easing::EaseOutQuint => "power4.out",
            Easing::EaseInOutQuint => "power4.inOut",
            Easing::EaseInSine => "sine.in",
            Easing::EaseOutSine => "sine.out",
            Easing::EaseInOutSine => "sine.inOut",
            Easing::CubicBezier(x1, y1, x2, y2) => {
                return write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})");
            }
        };
        f.write_str(id)
    }
}

/// Parse `cubic-bezier(x1, y1, x2, y2)`
fn parse_cubic_bezier(s: &str) -> Option<Easing> {
    let args = s.strip_prefix("cubic-bezier(")?.strip_suffix(')')?;
    let values: Vec<f32> = args
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        &[x1, y1, x2, y2] if (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2) => {
            Some(Easing::CubicBezier(x1, y1, x2, y2))
        }
        _ => None,
    }
}

/// Cubic bezier easing calculation (matches CSS spec / browser implementations).
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
/// Computes in f64 internally to avoid f32 precision jitter at 120fps.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = t as f64;
    let x1 = x1 as f64;
    let y1 = y1 as f64;
    let x2 = x2 as f64;
    let y2 = y2 as f64;

    // Solve for parameter `p` where bezier_x(p) == x using Newton-Raphson,
    // falling back to binary search if the slope is too flat.
    let mut p = x; // initial guess
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2) as f32;
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break; // slope too flat, switch to binary search
        }
        p -= err / slope;
    }

    // Binary search fallback (always converges)
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = x;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2) as f32
}

/// Evaluate cubic bezier at parameter t: B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    // Horner form: ((1-3p2+3p1)t + 3p2-6p1)t + 3p1) * t
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

/// Derivative of cubic bezier: B'(t) = 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 20] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
        Easing::EaseInSine,
        Easing::EaseOutSine,
        Easing::EaseInOutSine,
        Easing::CubicBezier(0.42, 0.0, 0.58, 1.0),
    ];

    #[test]
    fn test_endpoints_are_exact() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_parse_power_names() {
        assert_eq!("power3.out".parse::<Easing>().unwrap(), Easing::EaseOutQuart);
        assert_eq!("power2.out".parse::<Easing>().unwrap(), Easing::EaseOutCubic);
        assert_eq!("sine.inOut".parse::<Easing>().unwrap(), Easing::EaseInOutSine);
        assert_eq!("none".parse::<Easing>().unwrap(), Easing::Linear);
        assert_eq!(
            "cubic-bezier(0.1, 0.7, 1.0, 0.1)".parse::<Easing>().unwrap(),
            Easing::CubicBezier(0.1, 0.7, 1.0, 0.1)
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!(
            "bounce.wobble".parse::<Easing>(),
            Err(ScrollworkError::InvalidEasing(_))
        ));
        assert!("cubic-bezier(2.0, 0, 0, 1)".parse::<Easing>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for easing in [Easing::EaseOutQuart, Easing::EaseInOutSine, Easing::Linear] {
            assert_eq!(easing.to_string().parse::<Easing>().unwrap(), easing);
        }
    }

    #[test]
    fn test_ease_out_leads_linear() {
        assert!(Easing::EaseOutQuart.apply(0.3) > 0.3);
        assert!(Easing::EaseInQuad.apply(0.3) < 0.3);
    }
}
