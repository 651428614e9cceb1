use serde::{Deserialize, Serialize};

use crate::rest::NextSetRecommendation;

/// Observable state of the rest timer.
///
/// `remaining <= total` holds for both `Running` and `Paused`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RestTimerState {
    /// No active countdown.
    #[default]
    Idle,
    Running {
        remaining: u32,
        total: u32,
    },
    Paused {
        remaining: u32,
        total: u32,
    },
    /// Rest is over; carries what to do in the next set.
    Completed {
        next_set_recommendation: Option<NextSetRecommendation>,
    },
}

impl RestTimerState {
    pub fn is_running(&self) -> bool {
        matches!(self, RestTimerState::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, RestTimerState::Paused { .. })
    }

    /// Running or paused.
    pub fn is_active(&self) -> bool {
        self.is_running() || self.is_paused()
    }

    pub fn remaining(&self) -> Option<u32> {
        match self {
            RestTimerState::Running { remaining, .. } | RestTimerState::Paused { remaining, .. } => {
                Some(*remaining)
            }
            _ => None,
        }
    }

    pub fn total(&self) -> Option<u32> {
        match self {
            RestTimerState::Running { total, .. } | RestTimerState::Paused { total, .. } => {
                Some(*total)
            }
            _ => None,
        }
    }

    /// 0.0 .. 1.0 progress through the rest.
    pub fn progress(&self) -> f64 {
        match self {
            RestTimerState::Running { remaining, total }
            | RestTimerState::Paused { remaining, total } => {
                if *total == 0 {
                    return 1.0;
                }
                1.0 - (f64::from(*remaining) / f64::from(*total))
            }
            RestTimerState::Completed { .. } => 1.0,
            RestTimerState::Idle => 0.0,
        }
    }
}
