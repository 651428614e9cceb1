use serde::{Deserialize, Serialize};

/// Performance data for the set that just finished.
///
/// Only the calculator reads this; it is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetData {
    /// Load in kilograms.
    pub weight: f64,
    pub reps: u32,
    /// 0.0 (poor) .. 1.0 (perfect).
    pub form_quality: f64,
    /// Rate of perceived exertion, 1-10.
    #[serde(default)]
    pub rpe: Option<u8>,
    /// Heart rate in bpm at the end of the set.
    #[serde(default)]
    pub heart_rate: Option<u32>,
}

impl SetData {
    pub fn new(weight: f64, reps: u32, form_quality: f64) -> Self {
        Self {
            weight,
            reps,
            form_quality,
            rpe: None,
            heart_rate: None,
        }
    }
}

/// What to change for the next set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextSetRecommendation {
    pub suggestion: String,
    /// Kilograms to add (negative to remove).
    pub weight_adjustment: f64,
    /// Reps to add (negative to remove).
    pub rep_adjustment: i32,
    pub reason: String,
}

impl NextSetRecommendation {
    pub fn empty() -> Self {
        Self {
            suggestion: String::new(),
            weight_adjustment: 0.0,
            rep_adjustment: 0,
            reason: String::new(),
        }
    }
}

impl Default for NextSetRecommendation {
    fn default() -> Self {
        Self::empty()
    }
}

/// Everything shown to the user while resting.
///
/// Built once per rest and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestSuggestion {
    pub exercise_id: String,
    /// Rest duration in seconds.
    pub rest_time: u32,
    pub motivational_message: String,
    pub next_set_recommendation: NextSetRecommendation,
    pub form_tips: Vec<String>,
}

impl RestSuggestion {
    pub fn empty() -> Self {
        Self {
            exercise_id: String::new(),
            rest_time: 0,
            motivational_message: String::new(),
            next_set_recommendation: NextSetRecommendation::empty(),
            form_tips: Vec::new(),
        }
    }
}

impl Default for RestSuggestion {
    fn default() -> Self {
        Self::empty()
    }
}

/// Inputs for starting an adaptive rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestRequest {
    pub exercise_id: String,
    /// 0.0 .. 1.0 intensity of the finished set.
    pub intensity: f64,
    #[serde(default)]
    pub heart_rate: Option<u32>,
    #[serde(default)]
    pub perceived_exertion: Option<u8>,
    #[serde(default)]
    pub previous_set: Option<SetData>,
}

impl RestRequest {
    pub fn new(exercise_id: impl Into<String>, intensity: f64) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            intensity,
            heart_rate: None,
            perceived_exertion: None,
            previous_set: None,
        }
    }

    pub fn heart_rate(mut self, bpm: u32) -> Self {
        self.heart_rate = Some(bpm);
        self
    }

    pub fn perceived_exertion(mut self, rpe: u8) -> Self {
        self.perceived_exertion = Some(rpe);
        self
    }

    pub fn previous_set(mut self, set: SetData) -> Self {
        self.previous_set = Some(set);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_suggestion_has_no_content() {
        let s = RestSuggestion::empty();
        assert!(s.exercise_id.is_empty());
        assert_eq!(s.rest_time, 0);
        assert!(s.form_tips.is_empty());
        assert_eq!(s.next_set_recommendation, NextSetRecommendation::empty());
    }

    #[test]
    fn request_builder_sets_optional_signals() {
        let req = RestRequest::new("squat", 0.7)
            .heart_rate(150)
            .perceived_exertion(8)
            .previous_set(SetData::new(100.0, 5, 0.9));
        assert_eq!(req.heart_rate, Some(150));
        assert_eq!(req.perceived_exertion, Some(8));
        assert_eq!(req.previous_set.map(|s| s.reps), Some(5));
    }

    #[test]
    fn set_data_optional_fields_default_when_missing() {
        let set: SetData =
            serde_json::from_str(r#"{"weight":60.0,"reps":8,"form_quality":0.8}"#).unwrap();
        assert_eq!(set.rpe, None);
        assert_eq!(set.heart_rate, None);
    }
}
