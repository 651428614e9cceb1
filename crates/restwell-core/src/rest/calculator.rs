//! Adaptive rest duration model.
//!
//! A multiplicative factor model: the base rest is scaled by intensity,
//! then by heart-rate and RPE bands, then by a penalty for poor form on the
//! previous set. Factors are applied in that order and the result is only
//! rounded and clamped at the very end.

use super::types::{RestRequest, SetData};
use crate::storage::RestConfig;

/// Form quality below which the next rest is lengthened.
const POOR_FORM_THRESHOLD: f64 = 0.7;
const POOR_FORM_FACTOR: f64 = 1.2;

/// Heart-rate factor by band.
pub fn heart_rate_factor(bpm: u32) -> f64 {
    match bpm {
        hr if hr > 160 => 1.3,
        hr if hr > 140 => 1.1,
        hr if hr > 120 => 1.0,
        _ => 0.9,
    }
}

/// Perceived-exertion factor by band.
pub fn exertion_factor(rpe: u8) -> f64 {
    match rpe {
        r if r >= 9 => 1.4,
        r if r >= 7 => 1.2,
        r if r >= 5 => 1.0,
        _ => 0.8,
    }
}

/// Pure rest-duration calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveRestCalculator {
    base_seconds: f64,
    min_seconds: u32,
    max_seconds: u32,
}

impl AdaptiveRestCalculator {
    /// Calculator with the default 90 s base and [30, 300] bounds.
    pub fn new() -> Self {
        Self::from_config(&RestConfig::default())
    }

    /// Build from the `[rest]` config section.
    ///
    /// Bounds that are out of order are swapped rather than rejected; use
    /// [`RestConfig::validate`] to surface them as errors.
    pub fn from_config(config: &RestConfig) -> Self {
        let (min_seconds, max_seconds) = if config.min_seconds <= config.max_seconds {
            (config.min_seconds, config.max_seconds)
        } else {
            (config.max_seconds, config.min_seconds)
        };
        Self {
            base_seconds: f64::from(config.base_seconds),
            min_seconds,
            max_seconds,
        }
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.min_seconds, self.max_seconds)
    }

    /// Compute the rest duration in seconds.
    ///
    /// Absent signals simply skip their factor. Intensity outside [0, 1] is
    /// clamped and a non-finite intensity counts as 0.
    pub fn compute(
        &self,
        intensity: f64,
        heart_rate: Option<u32>,
        perceived_exertion: Option<u8>,
        previous_set: Option<&SetData>,
    ) -> u32 {
        let intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut rest = self.base_seconds;
        rest *= 0.5 + intensity;

        if let Some(bpm) = heart_rate {
            rest *= heart_rate_factor(bpm);
        }

        if let Some(rpe) = perceived_exertion {
            rest *= exertion_factor(rpe);
        }

        if let Some(set) = previous_set {
            if set.form_quality < POOR_FORM_THRESHOLD {
                rest *= POOR_FORM_FACTOR;
            }
        }

        let rounded = rest.round();
        if rounded <= f64::from(self.min_seconds) {
            self.min_seconds
        } else if rounded >= f64::from(self.max_seconds) {
            self.max_seconds
        } else {
            rounded as u32
        }
    }

    /// Compute for a full [`RestRequest`].
    pub fn compute_for(&self, request: &RestRequest) -> u32 {
        self.compute(
            request.intensity,
            request.heart_rate,
            request.perceived_exertion,
            request.previous_set.as_ref(),
        )
    }
}

impl Default for AdaptiveRestCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set_with_form(form_quality: f64) -> SetData {
        SetData::new(100.0, 5, form_quality)
    }

    #[test]
    fn intensity_scales_base() {
        let calc = AdaptiveRestCalculator::new();
        assert_eq!(calc.compute(0.0, None, None, None), 45);
        assert_eq!(calc.compute(0.5, None, None, None), 90);
        assert_eq!(calc.compute(1.0, None, None, None), 135);
    }

    #[test]
    fn heart_rate_bands() {
        assert_eq!(heart_rate_factor(161), 1.3);
        assert_eq!(heart_rate_factor(160), 1.1);
        assert_eq!(heart_rate_factor(141), 1.1);
        assert_eq!(heart_rate_factor(140), 1.0);
        assert_eq!(heart_rate_factor(121), 1.0);
        assert_eq!(heart_rate_factor(120), 0.9);

        let calc = AdaptiveRestCalculator::new();
        assert_eq!(calc.compute(0.5, Some(100), None, None), 81);
    }

    #[test]
    fn exertion_bands() {
        assert_eq!(exertion_factor(10), 1.4);
        assert_eq!(exertion_factor(9), 1.4);
        assert_eq!(exertion_factor(8), 1.2);
        assert_eq!(exertion_factor(7), 1.2);
        assert_eq!(exertion_factor(5), 1.0);
        assert_eq!(exertion_factor(4), 0.8);

        let calc = AdaptiveRestCalculator::new();
        assert_eq!(calc.compute(0.5, None, Some(4), None), 72);
    }

    #[test]
    fn poor_form_adds_recovery() {
        let calc = AdaptiveRestCalculator::new();
        assert_eq!(calc.compute(0.5, None, None, Some(&set_with_form(0.6))), 108);
        assert_eq!(calc.compute(0.5, None, None, Some(&set_with_form(0.7))), 90);
    }

    #[test]
    fn hard_set_with_poor_form() {
        // 90 * 1.4 * 1.3 * 1.4 * 1.2 = 275.18
        let calc = AdaptiveRestCalculator::new();
        let rest = calc.compute(0.9, Some(165), Some(9), Some(&set_with_form(0.6)));
        assert_eq!(rest, 275);
    }

    #[test]
    fn result_is_clamped() {
        let calc = AdaptiveRestCalculator::new();
        // 90 * 0.5 * 0.9 * 0.8 = 32.4 stays above the floor
        assert_eq!(calc.compute(0.0, Some(60), Some(1), None), 32);
        assert_eq!(calc.compute(1.0, Some(200), Some(10), Some(&set_with_form(0.0))), 295);

        let tight = AdaptiveRestCalculator::from_config(&RestConfig {
            min_seconds: 60,
            max_seconds: 120,
            ..RestConfig::default()
        });
        assert_eq!(tight.compute(0.0, Some(60), Some(1), None), 60);
        assert_eq!(tight.compute(1.0, Some(200), Some(10), None), 120);
    }

    #[test]
    fn non_finite_intensity_counts_as_zero() {
        let calc = AdaptiveRestCalculator::new();
        assert_eq!(calc.compute(f64::NAN, None, None, None), 45);
        assert_eq!(calc.compute(f64::INFINITY, None, None, None), 45);
        assert_eq!(calc.compute(4.0, None, None, None), 135);
    }

    #[test]
    fn swapped_bounds_are_normalized() {
        let calc = AdaptiveRestCalculator::from_config(&RestConfig {
            min_seconds: 300,
            max_seconds: 30,
            ..RestConfig::default()
        });
        assert_eq!(calc.bounds(), (30, 300));
    }

    #[test]
    fn compute_for_request_matches_compute() {
        let calc = AdaptiveRestCalculator::new();
        let req = RestRequest::new("deadlift", 0.75)
            .heart_rate(150)
            .perceived_exertion(8);
        assert_eq!(calc.compute_for(&req), calc.compute(0.75, Some(150), Some(8), None));
    }

    proptest! {
        #[test]
        fn always_within_bounds(
            intensity in 0.0f64..=1.0,
            heart_rate in proptest::option::of(0u32..=250),
            rpe in proptest::option::of(1u8..=10),
            form in proptest::option::of(0.0f64..=1.0),
        ) {
            let calc = AdaptiveRestCalculator::new();
            let set = form.map(set_with_form);
            let rest = calc.compute(intensity, heart_rate, rpe, set.as_ref());
            prop_assert!((30..=300).contains(&rest));
        }

        #[test]
        fn deterministic(
            intensity in 0.0f64..=1.0,
            heart_rate in proptest::option::of(0u32..=250),
            rpe in proptest::option::of(1u8..=10),
        ) {
            let calc = AdaptiveRestCalculator::new();
            prop_assert_eq!(
                calc.compute(intensity, heart_rate, rpe, None),
                calc.compute(intensity, heart_rate, rpe, None)
            );
        }
    }
}
