//! Rest suggestion generation: next-set progression, motivation, form tips.

use super::types::{NextSetRecommendation, RestSuggestion};

/// Intensity band of the finished set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityBand {
    /// Above 0.8: hold the load.
    High,
    /// Above 0.6: small progression.
    Moderate,
    /// Everything else: push harder.
    Low,
}

impl IntensityBand {
    pub fn classify(intensity: f64) -> Self {
        if intensity > 0.8 {
            IntensityBand::High
        } else if intensity > 0.6 {
            IntensityBand::Moderate
        } else {
            IntensityBand::Low
        }
    }

    pub fn recommendation(self) -> NextSetRecommendation {
        let (suggestion, weight_adjustment, rep_adjustment, reason) = match self {
            IntensityBand::High => (
                "Maintain current weight, focus on form",
                0.0,
                0,
                "High intensity set - prioritize recovery and form",
            ),
            IntensityBand::Moderate => (
                "Consider slight weight increase if form was good",
                1.25,
                0,
                "Good intensity - room for progression",
            ),
            IntensityBand::Low => (
                "Increase weight or reps for next set",
                2.5,
                1,
                "Low intensity - push harder for better stimulus",
            ),
        };
        NextSetRecommendation {
            suggestion: suggestion.to_string(),
            weight_adjustment,
            rep_adjustment,
            reason: reason.to_string(),
        }
    }
}

/// Motivational line for a rest of `rest_seconds`.
pub fn motivational_message(rest_seconds: u32) -> &'static str {
    match rest_seconds {
        s if s > 120 => "Take your time to recover fully. Quality over quantity! 💪",
        s if s > 90 => "Good rest leads to better performance. Stay focused! 🎯",
        s if s > 60 => "Almost ready! Prepare mentally for the next set. 🔥",
        _ => "Quick recovery! You're getting stronger with each set! ⚡",
    }
}

const SQUAT_TIPS: [&str; 3] = [
    "Keep chest up and core engaged",
    "Descend until thighs are parallel",
    "Drive through heels on the way up",
];

const BENCH_TIPS: [&str; 3] = [
    "Maintain tight shoulder blades",
    "Control the bar down to chest",
    "Drive feet into ground for stability",
];

const DEADLIFT_TIPS: [&str; 3] = [
    "Keep bar close to body",
    "Maintain neutral spine",
    "Hinge at hips, not knees",
];

const GENERIC_TIPS: [&str; 3] = [
    "Focus on controlled movement",
    "Maintain proper breathing",
    "Quality over quantity",
];

/// Form tips for an exercise id (case-insensitive).
pub fn form_tips(exercise_id: &str) -> Vec<String> {
    let tips: &[&str] = match exercise_id.to_lowercase().as_str() {
        "squat" | "squats" => &SQUAT_TIPS,
        "bench" | "bench_press" => &BENCH_TIPS,
        "deadlift" => &DEADLIFT_TIPS,
        _ => &GENERIC_TIPS,
    };
    tips.iter().map(|t| t.to_string()).collect()
}

/// Builds the [`RestSuggestion`] shown during a rest. Total: never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestSuggestionGenerator;

impl RestSuggestionGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, exercise_id: &str, rest_seconds: u32, intensity: f64) -> RestSuggestion {
        RestSuggestion {
            exercise_id: exercise_id.to_string(),
            rest_time: rest_seconds,
            motivational_message: motivational_message(rest_seconds).to_string(),
            next_set_recommendation: IntensityBand::classify(intensity).recommendation(),
            form_tips: form_tips(exercise_id),
        }
    }
}
