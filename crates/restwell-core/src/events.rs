use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coaching::Cue;
use crate::rest::NextSetRecommendation;

/// Every state change of the rest timer produces an Event.
/// UIs and loggers subscribe to them; the state stream carries the snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RestStarted {
        exercise_id: String,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u32,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    RestExtended {
        added_secs: u32,
        /// Start (and total) of the new run.
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    RestSkipped {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    RestCompleted {
        next_set_recommendation: Option<NextSetRecommendation>,
        at: DateTime<Utc>,
    },
    TimerStopped {
        at: DateTime<Utc>,
    },
    /// A cue was queued for the coaching sink at this remaining value.
    CueEmitted {
        cue: Cue,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    CoachingMessage {
        text: String,
        at: DateTime<Utc>,
    },
    EngineReleased {
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::RestStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::RestExtended { at, .. }
            | Event::RestSkipped { at, .. }
            | Event::RestCompleted { at, .. }
            | Event::TimerStopped { at }
            | Event::CueEmitted { at, .. }
            | Event::CoachingMessage { at, .. }
            | Event::EngineReleased { at } => *at,
        }
    }

    /// The cue carried by a `CueEmitted` event.
    pub fn cue(&self) -> Option<Cue> {
        match self {
            Event::CueEmitted { cue, .. } => Some(*cue),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::CueEmitted {
            cue: Cue::Countdown1,
            remaining_secs: 1,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CueEmitted");
        assert_eq!(json["cue"], "countdown_1");
        assert_eq!(event.cue(), Some(Cue::Countdown1));
    }
}
