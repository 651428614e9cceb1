//! One run of the countdown and its cue schedule.

use crate::coaching::Cue;

/// A single run: counts down from `start`, displaying against `total`.
///
/// A fresh or extended rest has `start == total`. A resumed rest keeps the
/// total of the rest it was paused in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub start: u32,
    pub total: u32,
}

impl Countdown {
    pub fn fresh(seconds: u32) -> Self {
        Self {
            start: seconds,
            total: seconds,
        }
    }

    pub fn resumed(remaining: u32, total: u32) -> Self {
        Self {
            start: remaining,
            total: total.max(remaining),
        }
    }

    /// Cue fired when the countdown reaches `remaining`, before that tick's
    /// state is published.
    pub fn cue_at(&self, remaining: u32) -> Option<Cue> {
        if remaining == self.start {
            // A zero-length run starts and completes on the same tick.
            return Some(if remaining == 0 {
                Cue::RestComplete
            } else {
                Cue::RestStarted
            });
        }
        match remaining {
            30 if self.start > 30 => Some(Cue::ThirtySecondsLeft),
            10 => Some(Cue::TenSecondsLeft),
            3 => Some(Cue::Countdown3),
            2 => Some(Cue::Countdown2),
            1 => Some(Cue::Countdown1),
            0 => Some(Cue::RestComplete),
            _ => None,
        }
    }

    /// Every cue of an uninterrupted run, with the remaining value it fires at.
    pub fn schedule(&self) -> Vec<(u32, Cue)> {
        (0..=self.start)
            .rev()
            .filter_map(|remaining| self.cue_at(remaining).map(|cue| (remaining, cue)))
            .collect()
    }
}
