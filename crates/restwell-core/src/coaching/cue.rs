use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coaching events emitted during a rest.
///
/// Each cue has a stable token (`"rest_started"`, `"countdown_3"`, ...)
/// that audio/voice collaborators resolve to actual output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    #[serde(rename = "rest_started")]
    RestStarted,
    #[serde(rename = "thirty_seconds_left")]
    ThirtySecondsLeft,
    #[serde(rename = "ten_seconds_left")]
    TenSecondsLeft,
    #[serde(rename = "countdown_3")]
    Countdown3,
    #[serde(rename = "countdown_2")]
    Countdown2,
    #[serde(rename = "countdown_1")]
    Countdown1,
    #[serde(rename = "rest_complete")]
    RestComplete,
    #[serde(rename = "rest_extended")]
    RestExtended,
    #[serde(rename = "rest_skipped")]
    RestSkipped,
}

impl Cue {
    pub const ALL: [Cue; 9] = [
        Cue::RestStarted,
        Cue::ThirtySecondsLeft,
        Cue::TenSecondsLeft,
        Cue::Countdown3,
        Cue::Countdown2,
        Cue::Countdown1,
        Cue::RestComplete,
        Cue::RestExtended,
        Cue::RestSkipped,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Cue::RestStarted => "rest_started",
            Cue::ThirtySecondsLeft => "thirty_seconds_left",
            Cue::TenSecondsLeft => "ten_seconds_left",
            Cue::Countdown3 => "countdown_3",
            Cue::Countdown2 => "countdown_2",
            Cue::Countdown1 => "countdown_1",
            Cue::RestComplete => "rest_complete",
            Cue::RestExtended => "rest_extended",
            Cue::RestSkipped => "rest_skipped",
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Cue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cue::ALL
            .into_iter()
            .find(|cue| cue.token() == s)
            .ok_or_else(|| format!("unknown cue token: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse_back() {
        for cue in Cue::ALL {
            assert_eq!(cue.token().parse::<Cue>().unwrap(), cue);
        }
        assert!("countdown_4".parse::<Cue>().is_err());
    }

    #[test]
    fn serde_uses_token() {
        assert_eq!(serde_json::to_string(&Cue::Countdown3).unwrap(), "\"countdown_3\"");
        assert_eq!(
            serde_json::from_str::<Cue>("\"thirty_seconds_left\"").unwrap(),
            Cue::ThirtySecondsLeft
        );
    }
}
