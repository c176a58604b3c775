//! Easing curves for the spin animation.
//!
//! Curves operate on `(elapsed, duration)` with `elapsed <= duration`; the
//! animation loop clamps elapsed before evaluating, so the final frame lands
//! exactly on the target. The marker bounce curve receives clamped progress
//! from its own mini-animation.

/// Named easing curves, selected by key at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Easing {
    /// Default wheel deceleration: `1 - (1 - t)^4`.
    #[default]
    WheelOut,
    OutQuad,
    OutCubic,
    OutQuart,
    OutExpo,
    InOutCubic,
    /// Dedicated curve for the marker bounce; overshoot-free snap-back.
    MarkerBounce,
}

impl Easing {
    /// Look up a curve by its configuration key. Unrecognized keys fall back
    /// to the default wheel curve rather than failing.
    pub fn from_key(key: &str) -> Option<Easing> {
        match key {
            "wheel" => Some(Easing::WheelOut),
            "easeOutQuad" => Some(Easing::OutQuad),
            "easeOutCubic" => Some(Easing::OutCubic),
            "easeOutQuart" => Some(Easing::OutQuart),
            "easeOutExpo" => Some(Easing::OutExpo),
            "easeInOutCubic" => Some(Easing::InOutCubic),
            "markerBounce" => Some(Easing::MarkerBounce),
            _ => None,
        }
    }

    /// Evaluate the curve for `elapsed` milliseconds out of `duration`.
    pub fn eval(self, elapsed: f64, duration: f64) -> f64 {
        match self {
            Easing::WheelOut => 1.0 - (1.0 - elapsed / duration).powi(4),
            Easing::OutQuad => {
                let t = elapsed / duration;
                -t * (t - 2.0)
            }
            Easing::OutCubic => {
                let t = elapsed / duration - 1.0;
                t * t * t + 1.0
            }
            Easing::OutQuart => {
                let t = elapsed / duration - 1.0;
                1.0 - t * t * t * t
            }
            Easing::OutExpo => {
                if elapsed == duration {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * elapsed / duration)
                }
            }
            Easing::InOutCubic => {
                let t = elapsed / duration;
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::MarkerBounce => {
                let t = elapsed / duration;
                let v = 1.0 - (1.0 - 6.0 * t).powi(2);
                if v < 0.0 { 0.0 } else { v }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_has_no_curve() {
        assert_eq!(Easing::from_key("bouncyCastle"), None);
        assert_eq!(Easing::from_key("easeOutExpo"), Some(Easing::OutExpo));
    }

    #[test]
    fn all_out_curves_start_at_zero_and_end_at_one() {
        for e in [
            Easing::WheelOut,
            Easing::OutQuad,
            Easing::OutCubic,
            Easing::OutQuart,
            Easing::OutExpo,
            Easing::InOutCubic,
        ] {
            assert!(e.eval(0.0, 1000.0).abs() < 1e-9, "{e:?} start");
            assert!((e.eval(1000.0, 1000.0) - 1.0).abs() < 1e-9, "{e:?} end");
        }
    }

    #[test]
    fn curves_are_monotonic_over_the_spin() {
        for e in [Easing::WheelOut, Easing::OutQuad, Easing::OutCubic, Easing::InOutCubic] {
            let mut prev = -1.0;
            for step in 0..=100 {
                let v = e.eval(step as f64 * 10.0, 1000.0);
                assert!(v >= prev - 1e-12, "{e:?} dipped at step {step}");
                prev = v;
            }
        }
    }

    #[test]
    fn marker_bounce_peaks_and_returns() {
        // Peaks at t = 1/6, back to zero by t = 1/3, clamped flat after.
        assert!((Easing::MarkerBounce.eval(1.0 / 6.0, 1.0) - 1.0).abs() < 1e-9);
        assert!(Easing::MarkerBounce.eval(0.5, 1.0).abs() < 1e-9);
        assert_eq!(Easing::MarkerBounce.eval(1.0, 1.0), 0.0);
    }
}
