mod calculator;
mod suggestion;
mod types;

pub use calculator::{exertion_factor, heart_rate_factor, AdaptiveRestCalculator};
pub use suggestion::{form_tips, motivational_message, IntensityBand, RestSuggestionGenerator};
pub use types::{NextSetRecommendation, RestRequest, RestSuggestion, SetData};
